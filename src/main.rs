//! pslc — compile a PSL source file into a self-contained HTML document.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use pslc::Compiler;

#[derive(Parser)]
#[command(name = "pslc", version, about = "PSL to HTML compiler")]
struct Args {
    /// PSL source file to compile.
    input: PathBuf,

    /// Output HTML file.
    #[arg(short, long, default_value = "output.html")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", args.input.display());
            process::exit(1);
        }
    };

    let html = match Compiler::compile(&source) {
        Ok(html) => html,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = fs::write(&args.output, html) {
        eprintln!("error: cannot write {}: {err}", args.output.display());
        process::exit(1);
    }

    println!(
        "compiled {} -> {}",
        args.input.display(),
        args.output.display()
    );
}
