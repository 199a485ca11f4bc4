// This is the entry point for the CLI application.
// It parses command-line arguments, loads the Swagger document and renders one set of files per section.

use std::process;
use std::time::Duration;
use clap::Parser;
use swagger_section_generator::cli::Args;
use swagger_section_generator::{generate_from_sections, load_sections, GeneratorOptions, SchemaSource, SectionedEndpoints};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    let source = SchemaSource::parse(&args.input);
    let parse_options = args.parse_options();
    let sections = match load_sections(&source, &parse_options, Duration::from_secs(args.timeout_secs)) {
        Ok(sections) => sections,
        Err(err) => {
            eprintln!("Error reading {}: {}", source, err);
            process::exit(1);
        }
    };

    let generator_options = GeneratorOptions {
        base_url: args.base_url.clone(),
        api_key: args.api_key.clone(),
        bearer: args.bearer.clone(),
    };

    if let Err(err) = generate_from_sections(&sections, &args.output_dir, args.framework, &generator_options, args.dump_json) {
        eprintln!("Error generating sources: {}", err);
        process::exit(1);
    }

    for (tag, endpoints) in sections.iter() {
        println!("Generated section '{}' ({}): {} endpoint(s)", tag, SectionedEndpoints::class_name(tag), endpoints.len());
    }
    println!("Sources generated successfully in {}", args.output_dir.display());
}
