use anyhow::Context as _;
use clap::Args;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    convert::Infallible,
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write, stdin, stdout},
    path::PathBuf,
};

/// Where a subcommand reads its JSON document and writes its JSON report
#[derive(Args, Debug)]
pub struct IOArgs {
    /// The input JSON file ("-" reads stdin)
    #[arg(value_parser = parse_location)]
    input: Location,

    /// The report file ("-" writes stdout)
    #[arg(short, long, default_value = "-", value_parser = parse_location)]
    output: Location,
}

impl IOArgs {
    /// Deserialize the input document, naming its source on failure
    pub fn read_json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let parsed = match &self.input {
            Location::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("cannot open {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
            }
            Location::Stdio => serde_json::from_reader(stdin().lock()),
        };
        parsed.with_context(|| format!("malformed input from {}", self.input))
    }

    /// Write `report` as pretty-printed JSON followed by a newline
    pub fn write_json<T: Serialize>(&self, report: &T) -> anyhow::Result<()> {
        match &self.output {
            Location::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                emit(BufWriter::new(file), report)
            }
            Location::Stdio => emit(stdout().lock(), report),
        }
    }
}

fn emit<T: Serialize>(mut writer: impl Write, report: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
enum Location {
    File(PathBuf),
    Stdio,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => path.display().fmt(f),
            Self::Stdio => f.write_str("standard input"),
        }
    }
}

fn parse_location(s: &str) -> Result<Location, Infallible> {
    Ok(if s == "-" {
        Location::Stdio
    } else {
        Location::File(PathBuf::from(s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        io: IOArgs,
    }

    #[test]
    fn test_dash_means_stdio() {
        let args = Wrapper::try_parse_from(["lemclear", "-"]).unwrap().io;
        assert_eq!(args.input, Location::Stdio);
        assert_eq!(args.output, Location::Stdio);
    }

    #[test]
    fn test_json_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        fs::write(&input, r#"{ "id": "09:00", "bids": [] }"#).unwrap();

        let args = Wrapper::try_parse_from([
            "lemclear",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap()
        .io;
        let document = args.read_json::<serde_json::Value>().unwrap();
        args.write_json(&document).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.ends_with('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&written).unwrap(),
            document
        );
    }

    #[test]
    fn test_errors_name_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.json");
        fs::write(&input, "{ not json").unwrap();

        let args = Wrapper::try_parse_from(["lemclear", input.to_str().unwrap()])
            .unwrap()
            .io;
        let error = args.read_json::<serde_json::Value>().unwrap_err();
        assert!(error.to_string().contains("broken.json"));

        let args = Wrapper::try_parse_from(["lemclear", "/nonexistent/period.json"])
            .unwrap()
            .io;
        let error = args.read_json::<serde_json::Value>().unwrap_err();
        assert!(error.to_string().starts_with("cannot open"));
    }
}
