use clap::Parser;
use greetmaster_page::{decode_page, render_html_card, CardPage, FieldMode, PageError};
use std::fs;
use std::path::PathBuf;
use std::process;

/// Run the card rewriting pipeline over one archived page and print the result.
#[derive(Parser, Debug)]
#[command(name = "page-rewrite")]
struct Args {
    /// Archived page on disk
    file: PathBuf,

    /// Archive-relative path of the page, e.g. www.example.com/cards/0001/index.html
    archive_path: String,

    /// Card id used for glyph images
    #[arg(long, default_value = "0")]
    card_id: String,

    /// Base64 field data; renders tokens instead of making them editable
    #[arg(long)]
    data: Option<String>,

    /// Source encoding label (defaults to UTF-8)
    #[arg(long)]
    encoding: Option<String>,
}

fn main() {
    let args = Args::parse();

    match rewrite(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("✗ {} could not be rewritten:", args.file.display());
            print_error(&e);
            process::exit(1);
        }
    }
}

fn rewrite(args: &Args) -> Result<String, PageError> {
    let bytes = fs::read(&args.file).map_err(|e| PageError::Io(e.to_string()))?;
    let text = decode_page(&bytes, args.encoding.as_deref())?;
    let card = render_html_card(&CardPage {
        text: &text,
        page_path: &args.archive_path,
        card_id: &args.card_id,
        mode: FieldMode::from_param(args.data.as_deref()),
    });
    if card.style.is_empty() {
        Ok(card.body)
    } else {
        Ok(format!("{}\n{}", card.style, card.body))
    }
}

fn print_error(error: &PageError) {
    match error {
        PageError::UnknownEncoding { label } => {
            eprintln!("  Unknown encoding '{}':", label);
            eprintln!("    Expected a WHATWG encoding label such as windows-1252 or Shift_JIS");
        }
        PageError::Io(msg) => {
            eprintln!("  Failed to read file:");
            eprintln!("    {}", msg);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
