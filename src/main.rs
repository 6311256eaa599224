use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind};
use colored::Colorize;
use log::info;
use std::{
    cmp::Reverse,
    collections::HashMap,
    fs,
    io::{self, IsTerminal, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

mod ops;
use ops::{count_grades, filter, latest};

mod recording;
use recording::{FilteredRecording, Recording};

#[derive(Parser, Debug)]
#[command(version, about = "Command line code snapshot recording filter.", long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        help = "Start of the exercise, \"YYYY-MM-DD HH:MM:SS\".",
        default_value = filter::DEFAULT_START_TIME,
        global = true
    )]
    start_time: String,

    #[clap(subcommand)]
    command: Commands,

    /// Input recording file (use '-' for stdin).
    #[arg(default_value = "-")]
    file: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Keep snapshots at or before the minute mark and emit the reduced document.
    Filter(FilterArgs),

    /// Like filter, but keep only each student's newest snapshot.
    Latest(FilterArgs),

    /// Count snapshots per grade.
    CountGrades(CountGradesArgs),

    /// Return the contents of the recording.
    Output,
}

#[derive(Debug, clap::Args)]
struct FilterArgs {
    /// Minutes elapsed since the start time; zero and negative values are allowed.
    #[arg(allow_negative_numbers = true)]
    minutes: i64,

    #[arg(short, long, help = "Write the document to this file instead of stdout.")]
    output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct CountGradesArgs {
    #[arg(
        short,
        long,
        allow_negative_numbers = true,
        help = "Only tally snapshots at or before this minute mark."
    )]
    minutes: Option<i64>,
}

fn main() -> ExitCode {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn read_input(file_path: &String) -> Result<String> {
    fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file: {}", file_path))
}

fn parse_recording(input: &str) -> Result<Recording> {
    // parse the file
    serde_json::from_str(input).map_err(|e| {
        // on error, get 1-based line and column number of error
        let line = e.line();
        let column = e.column();

        // prepare context lines
        let lines: Vec<&str> = input.lines().collect();
        // go to 0-based
        let line_index = line.saturating_sub(1);
        // show 5 lines before
        let start = line_index.saturating_sub(5);
        // show 5 lines after
        let end = (line_index + 5).min(lines.len());

        // build context display
        let context_lines = lines.get(start..end).unwrap_or_default();
        let error_line_in_context = line_index.saturating_sub(start);

        let mut context_str = String::new();
        for (i, line) in context_lines.iter().enumerate() {
            // add source
            context_str.push_str(line);
            context_str.push('\n');

            // add line pointer
            if i == error_line_in_context {
                let pointer = format!(
                    "{}{}",
                    " ".repeat(column.saturating_sub(1)), // alignment
                    "^-- here".purple().bold()
                );
                context_str.push_str(&pointer);
                context_str.push('\n');
            }
        }

        // cleanup trailing newline
        if context_str.ends_with('\n') {
            context_str.pop();
        }

        anyhow!(
            "recording is not valid JSON at line {line}:{column}\n\
             {}: {e}\n\
             {}:\n{}\n",
            "Cause".red().bold(),
            "Context".yellow().bold(),
            context_str
        )
    })
    .context("Failed to parse recording")
}

fn write_document(document: &FilteredRecording, output: Option<&Path>) -> Result<()> {
    let serialized =
        serde_json::to_string_pretty(document).context("Failed to serialize document")?;

    match output {
        Some(path) => {
            fs::write(path, serialized)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            println!(
                "{} {} snapshot(s) to {}",
                "Wrote".green().bold(),
                document.snapshots.len(),
                path.display()
            );
        }
        None => println!("{}", serialized),
    }

    Ok(())
}

fn report(document: &FilteredRecording) {
    info!("target time {}", document.target_timestamp);
    info!("kept {} snapshot(s)", document.snapshots.len());
    if let Some(first) = document.snapshots.first() {
        info!(
            "earliest kept snapshot {} from student {} at {}",
            first.snapshot_id, first.student_id, first.timestamp
        );
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let start_time = filter::parse_timestamp(&args.start_time)
        .map_err(|e| anyhow!("Invalid start time {:?}: {}", args.start_time, e))?;

    let contents = match args.file {
        stdin if stdin == "-" => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                #[allow(unreachable_code)]
                return Err(Args::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "Missing required argument: either provide a file or pipe input."
                    )
                    .exit());
            }

            let mut contents = String::new();
            stdin.read_to_string(&mut contents)?;
            contents
        },
        file => read_input(&file)?,
    };

    let parsed = parse_recording(&contents)?;
    info!("loaded {} snapshot(s)", parsed.code_snapshots.entries.len());

    match args.command {
        Commands::Filter(filter_args) => {
            let document = filter::filter_by_elapsed(&parsed, filter_args.minutes, start_time)?;
            report(&document);
            write_document(&document, filter_args.output.as_deref())?;
        }

        Commands::Latest(filter_args) => {
            let document = latest::latest_per_student(filter::filter_by_elapsed(
                &parsed,
                filter_args.minutes,
                start_time,
            )?);
            report(&document);
            write_document(&document, filter_args.output.as_deref())?;
        }

        Commands::CountGrades(count_args) => {
            let mut counts = HashMap::new();
            match count_args.minutes {
                Some(minutes) => {
                    let document = filter::filter_by_elapsed(&parsed, minutes, start_time)?;
                    count_grades::get_counts(
                        document.snapshots.iter().map(|s| s.grade.as_str()),
                        &mut counts,
                    );
                }
                None => {
                    count_grades::get_counts(
                        parsed
                            .code_snapshots
                            .entries
                            .iter()
                            .map(|e| e.grade.as_deref().unwrap_or_default()),
                        &mut counts,
                    );
                }
            }

            let mut counts_vec: Vec<(&String, &usize)> = counts.iter().collect();
            counts_vec.sort_by_key(|a| Reverse(a.1));

            for (grade, count) in counts_vec {
                let label = if grade.is_empty() { "not graded" } else { grade };
                println!("{}: {}", label, count);
            }
        }

        Commands::Output => {
            println!("{}", json::stringify_pretty(json::parse(&contents)?, 4));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_input_missing_file() {
        let result = read_input(&"/nonexistent/recording.json".to_string());
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to read file"));
    }

    #[test]
    fn test_read_input_round_trips_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let contents = read_input(&file.path().display().to_string()).unwrap();
        assert_eq!(contents, "{}");
    }

    #[test]
    fn test_parse_recording_accepts_minimal_document() {
        let recording = parse_recording("{}").unwrap();
        assert!(recording.code_snapshots.entries.is_empty());
    }

    #[test]
    fn test_parse_recording_rejects_invalid_json() {
        let result = parse_recording("{ \"codeSnapshots\": ");
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("not valid JSON"));
    }

    #[test]
    fn test_parse_recording_rejects_wrongly_typed_entries() {
        let result = parse_recording("{ \"codeSnapshots\": { \"entries\": 3 } }");
        assert!(result.is_err());
    }
}
