//! Live Markdown - Demo Entry Point
//!
//! Reads markdown from the command line (or stdin when no argument is given),
//! runs the full pipeline, and prints the styling ranges as JSON followed by
//! an outline of the rendered visual tree. Useful for eyeballing how a piece
//! of markdown decomposes without wiring up a host surface.

use std::io::Read;

use log::info;

use live_markdown::render::{render_ranges, MarkdownStyle, NodeKind, VisualTree};
use live_markdown::{parse_to_ranges, shared_engine, NodeId};

fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let markdown = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    info!("Parsing {} bytes of markdown", markdown.len());

    let ranges = match parse_to_ranges(shared_engine(), &markdown) {
        Ok(ranges) => ranges,
        Err(err) => {
            eprintln!("parse failed: {}", err);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&ranges) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("could not serialize ranges: {}", err),
    }

    let tree = render_ranges(&markdown, &ranges, &MarkdownStyle::default());
    println!();
    print_outline(&tree, tree.root(), 0);

    Ok(())
}

/// Print the visual tree as an indented outline.
fn print_outline(tree: &VisualTree, id: NodeId, indent: usize) {
    let pad = "  ".repeat(indent);
    match &tree.node(id).kind {
        NodeKind::Root => println!("{}root", pad),
        NodeKind::Span { kind, .. } => println!("{}span [{}]", pad, kind.as_str()),
        NodeKind::Text(text) => println!("{}text {:?}", pad, text),
        NodeKind::LineBreak => println!("{}line-break", pad),
    }
    for &child in tree.children(id) {
        print_outline(tree, child, indent + 1);
    }
}
