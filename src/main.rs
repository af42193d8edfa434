use anyhow::Result;
use clap::Parser;
use std::time;
use vcx::{
    cli::{Cli, Command, FULL_VERSION, init_verbose},
    commands::{collect, count, filter, merge, sort},
    utils::util::handle_error_and_exit,
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    log::trace!("CLI options set: {:?}", cli);

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Count(args) => {
            let rows = count::count(&args.vcf, args.gzip)?;
            println!("{rows}");
        }
        Command::Collect(args) => {
            let json = match args.num_rows {
                Some(num_rows) => collect::collect(
                    num_rows,
                    args.start_row,
                    &args.vcf,
                    args.gzip,
                    args.num_threads,
                )?,
                None => collect::collect_all(&args.vcf, args.gzip, args.num_threads)?,
            };
            println!("{json}");
        }
        Command::Filter(args) => filter::filter(
            &args.include,
            &args.vcf,
            &args.output,
            args.gzip,
            args.num_threads,
        )?,
        Command::Sort(args) => sort::sort(&args.vcf, &args.output, args.chunk_size)?,
        Command::Merge(args) => merge::merge(&args.vcf1, &args.vcf2, &args.output)?,
    }
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());

    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
