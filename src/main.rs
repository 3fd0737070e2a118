//! # pagefit CLI
//!
//! Usage:
//!   pagefit report.json -o report.pdf
//!   echo '{ ... }' | pagefit -o report.pdf
//!   pagefit report.json --image ./a.png --image ./b.jpg --columns 3
//!   pagefit --example > report.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pagefit::model::{PageSize, Report};
use pagefit::{render_report, PagefitError};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Report JSON. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Extra image attachment, appended after the report's own. Repeatable.
    #[arg(long = "image", value_name = "PATH")]
    images: Vec<PathBuf>,

    /// Photo columns per grid row.
    #[arg(long)]
    columns: Option<usize>,

    /// Page size, overriding the report.
    #[arg(long, value_enum)]
    page_size: Option<PageSizeArg>,

    /// Print a sample report and exit.
    #[arg(long, default_value_t = false)]
    example: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageSizeArg {
    Letter,
    A4,
    Legal,
}

impl From<PageSizeArg> for PageSize {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("pagefit=warn"))
        .init();
    let args = Args::parse();

    if args.example {
        print!("{}", example_report_json());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(written) => {
            eprintln!("✓ Written {} bytes to {}", written, args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<usize, PagefitError> {
    let input = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut report: Report = serde_json::from_str(&input)?;
    apply_overrides(&mut report, args);

    let pdf_bytes = render_report(&report)?;
    fs::write(&args.output, &pdf_bytes)?;
    Ok(pdf_bytes.len())
}

fn apply_overrides(report: &mut Report, args: &Args) {
    if let Some(columns) = args.columns {
        report.image_layout.columns = columns.max(1);
    }
    if let Some(size) = args.page_size {
        report.page.size = size.into();
    }
    for path in &args.images {
        // Explicit prefix so the loader treats it as a path, not base64.
        let src = if path.is_absolute() || path.starts_with(".") {
            path.display().to_string()
        } else {
            format!("./{}", path.display())
        };
        report.attachments.push(src);
    }
}

fn example_report_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Service Visit #4471",
    "author": "Field Operations"
  },
  "page": {
    "size": "Letter",
    "margin": { "top": 36, "right": 54, "bottom": 36, "left": 54 }
  },
  "title": "Service Visit #4471",
  "subtitle": "Unit 12B, 400 Harbor Road",
  "sections": [
    {
      "heading": "Issue",
      "paragraphs": [
        "Tenant reports intermittent loss of hot water in the kitchen and the main bathroom, worst in the early morning."
      ]
    },
    {
      "heading": "Action Items",
      "bullets": [
        "Inspect the water heater thermostat and relief valve",
        "Check the mixing valve under the kitchen sink",
        "Photograph the serial plate for the warranty claim"
      ]
    }
  ],
  "attachments": [],
  "imageLayout": {
    "columns": 2
  }
}
"##
}
