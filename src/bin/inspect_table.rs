use anyhow::{Context, Result};
use pcscraper::{
    table::{filter::first_cell_text, RowAssembler},
    tree::{html::parse_document, html::select_in, TreeNode},
};
use std::{env, fs, path::Path, process::exit};

fn main() {
    // Expect an HTML file and an optional container selector.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <HTML_FILE> [SELECTOR]", args[0]);
        exit(1);
    }
    let selector = args.get(2).map_or("table, ul", String::as_str);
    if let Err(e) = inspect_tables(Path::new(&args[1]), selector) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print the layout the assembler sees for every container matching `selector`.
fn inspect_tables(path: &Path, selector: &str) -> Result<()> {
    let markup = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let doc = parse_document(&markup);
    let containers = select_in(&doc, selector)?;

    println!("=== {} ===", path.display());
    println!("Containers matching `{}`: {}", selector, containers.len());
    println!();

    for (i, container) in containers.into_iter().enumerate() {
        let classes = container.classes().join(".");
        let asm = match RowAssembler::new(container) {
            Ok(asm) => asm,
            Err(e) => {
                println!("[{}] <{}> skipped: {}", i, container.tag(), e);
                continue;
            }
        };

        println!("[{}] <{}.{}>", i, container.tag(), classes);
        println!(
            "    layout:       {} > {} > {}",
            asm.body_tag(),
            asm.row_tag(),
            asm.column_tag()
        );
        match asm.header() {
            Some(header) => println!("    header:       {}", header.join(" | ")),
            None => println!("    header:       <none>"),
        }
        println!("    table_length: {}", asm.table_length());
        println!("    row_length:   {}", asm.row_length());

        if let Some(first) = asm.first_row() {
            println!(
                "    first cell:   {}",
                first_cell_text(first, asm.column_tag()).unwrap_or_default()
            );
        }
        println!();
    }
    Ok(())
}
