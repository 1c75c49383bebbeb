use line_records::{CursorOptions, LineSource, OffsetTable, RecordCursor, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default, PartialEq)]
struct Args {
    path: String,
    delimiter: Option<String>,
    fields: Vec<String>,
    seek: Option<u64>,
    limit: Option<usize>,
    index: Option<String>,
    encoding: Option<String>,
}

/// Parses everything after the program name: `<path> [flags...]`.
fn parse_args(argv: &[String]) -> std::result::Result<Args, String> {
    let (path, flags) = argv
        .split_first()
        .ok_or_else(|| "missing input path.".to_string())?;
    let mut args = Args {
        path: path.clone(),
        ..Args::default()
    };

    let mut rest = flags.iter();
    while let Some(flag) = rest.next() {
        let mut value = || {
            rest.next()
                .cloned()
                .ok_or_else(|| format!("{} flag requires an argument.", flag))
        };
        match flag.as_str() {
            "--delimiter" => args.delimiter = Some(value()?),
            "--fields" => args.fields = value()?.split(',').map(str::to_string).collect(),
            "--seek" => args.seek = Some(parse_number(flag, &value()?)?),
            "--limit" => args.limit = Some(parse_number(flag, &value()?)?),
            "--index" => args.index = Some(value()?),
            "--encoding" => args.encoding = Some(value()?),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(args)
}

fn parse_number<N: std::str::FromStr>(flag: &str, raw: &str) -> std::result::Result<N, String> {
    raw.parse()
        .map_err(|_| format!("Invalid {} value: {}", flag, raw))
}

fn cursor_options(args: &Args) -> Result<CursorOptions> {
    let mut options = CursorOptions::new().with_field_names(args.fields.iter().cloned());
    if let Some(delimiter) = &args.delimiter {
        options = options.with_delimiter(delimiter.as_str());
    }
    if let Some(label) = &args.encoding {
        options = options.with_encoding(label)?;
    }
    Ok(options)
}

/// Reuses a saved side index when present, otherwise writes one after the scan.
///
/// Returns `true` when an existing side index was loaded.
fn attach_side_index<S: LineSource + ?Sized>(
    cursor: &mut RecordCursor<'_, S>,
    index_path: &Path,
) -> Result<bool> {
    if index_path.exists() {
        cursor.set_offset_table(OffsetTable::load(index_path)?);
        return Ok(true);
    }
    cursor.offset_table()?.save(index_path)?;
    Ok(false)
}

/// Writes one JSON object per record, starting at the cursor's position.
fn write_records<S: LineSource + ?Sized, W: Write>(
    cursor: &mut RecordCursor<'_, S>,
    limit: Option<usize>,
    out: &mut W,
) -> Result<()> {
    for result in cursor.records().take(limit.unwrap_or(usize::MAX)) {
        let (ordinal, record) = result?;
        // Written by hand so the record keeps its field order.
        write!(out, "{{\"ordinal\":{},\"record\":", ordinal)?;
        serde_json::to_writer(&mut *out, &record).map_err(io::Error::from)?;
        writeln!(out, "}}")?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let options = cursor_options(args)?;
    let mut reader = BufReader::new(File::open(&args.path)?);
    let mut cursor = RecordCursor::new(&mut reader, options);

    if let Some(index_path) = &args.index {
        attach_side_index(&mut cursor, Path::new(index_path))?;
    }

    eprintln!("Reading: {}", args.path);
    eprintln!("Records: {}", cursor.count()?);
    eprintln!("{}", "=".repeat(60));

    if let Some(position) = args.seek {
        cursor.seek(position)?;
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_records(&mut cursor, args.limit, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let argv: Vec<String> = env::args().collect();

    if argv.len() < 2 {
        let program = argv.first().map(String::as_str).unwrap_or("line-records");
        eprintln!(
            "Usage: {} <path> [--delimiter <D>] [--fields <a,b,c>] [--seek <N>] [--limit <N>] \
             [--index <FILE>] [--encoding <LABEL>]",
            program
        );
        std::process::exit(1);
    }

    let args = match parse_args(&argv[1..]) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("ERROR: {}", message);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("\nERROR: Failed to read {}", args.path);
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn parses_every_flag() {
        let args = parse_args(&argv(&[
            "data.csv",
            "--delimiter",
            ";",
            "--fields",
            "id,name",
            "--seek",
            "7",
            "--limit",
            "3",
            "--index",
            "data.lrec",
            "--encoding",
            "latin1",
        ]))
        .unwrap();

        assert_eq!(
            args,
            Args {
                path: "data.csv".into(),
                delimiter: Some(";".into()),
                fields: vec!["id".into(), "name".into()],
                seek: Some(7),
                limit: Some(3),
                index: Some("data.lrec".into()),
                encoding: Some("latin1".into()),
            }
        );
    }

    #[test]
    fn path_alone_uses_defaults() {
        let args = parse_args(&argv(&["lines.txt"])).unwrap();
        assert_eq!(args, Args { path: "lines.txt".into(), ..Args::default() });
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(&[]).is_err());
        let err = parse_args(&argv(&["f", "--seek"])).unwrap_err();
        assert!(err.contains("--seek flag requires an argument"), "{}", err);
        let err = parse_args(&argv(&["f", "--limit", "many"])).unwrap_err();
        assert_eq!(err, "Invalid --limit value: many");
        let err = parse_args(&argv(&["f", "--verbose"])).unwrap_err();
        assert_eq!(err, "Unknown argument: --verbose");
    }

    #[test]
    fn side_index_is_written_then_reused() {
        let dir = tempdir().expect("temp dir");
        let index_path = dir.path().join("lines.lrec");

        let mut stream = Cursor::new("a\nbb\nccc\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        assert!(!attach_side_index(&mut cursor, &index_path).unwrap());
        assert_eq!(
            OffsetTable::load(&index_path).unwrap().as_slice(),
            &[0, 2, 5]
        );

        // A different stream proves the saved table is used instead of a scan.
        let mut other = Cursor::new("a\nbb\nccc\ndddd\n");
        let mut cursor = RecordCursor::new(&mut other, CursorOptions::default());
        assert!(attach_side_index(&mut cursor, &index_path).unwrap());
        assert_eq!(cursor.count().unwrap(), 3);
    }

    #[test]
    fn writes_json_lines_from_seek_position() {
        let args = parse_args(&argv(&["f", "--delimiter", ",", "--fields", "id"])).unwrap();
        let mut stream = Cursor::new("1,x\n2,y\n3,z\n");
        let mut cursor = RecordCursor::new(&mut stream, cursor_options(&args).unwrap());
        cursor.seek(1).unwrap();

        let mut out = Vec::new();
        write_records(&mut cursor, Some(1), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"ordinal\":1,\"record\":{\"id\":\"2\",\"_1\":\"y\"}}\n"
        );
    }
}
