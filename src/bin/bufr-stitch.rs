//! BUFR tank stitcher.
//!
//! Takes selected subsets from a spec dump's tank and stitches them into the base dump's tank.

use bufr_stitch::{CommonCmdLineArgs, Inventory, Stitcher};
use std::error::Error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(ref e) = run() {
        println!("error: {}", e);

        let mut err: &dyn Error = &**e;

        while let Some(cause) = err.source() {
            println!("caused by: {}", cause);
            err = cause;
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let app = CommonCmdLineArgs::new_app(
        "bufr-stitch",
        "Stitch selected subsets of a spec tank into a base tank.",
    );

    let (args, _matches) = CommonCmdLineArgs::matches(app)?;

    if args.check() {
        return check(&args);
    }

    let stitcher = Stitcher::new(args.config().clone())?;

    match args.through() {
        None => {
            stitcher.stitch(args.base_dump(), args.spec_dump(), args.cycle())?;
        }
        Some(last) => {
            let results =
                stitcher.stitch_range(args.base_dump(), args.spec_dump(), args.cycle(), last);

            let failed = results.iter().filter(|(_, res)| res.is_err()).count();
            if failed > 0 {
                return Err(format!("{} of {} cycles failed", failed, results.len()).into());
            }
        }
    }

    Ok(())
}

fn check(args: &CommonCmdLineArgs) -> Result<(), Box<dyn Error>> {
    let last = args.through().unwrap_or_else(|| args.cycle());

    let inv = Inventory::scan(
        args.config(),
        args.base_dump(),
        args.spec_dump(),
        args.cycle(),
        last,
    )?;

    println!(
        "{} into {} from {} through {}",
        args.spec_dump(),
        args.base_dump(),
        inv.first,
        inv.last
    );
    println!("  ready: {}", inv.ready.len());
    for cycle in &inv.missing_base {
        println!("  missing {} tank: {}", args.base_dump(), cycle);
    }
    for cycle in &inv.missing_spec {
        println!("  missing {} tank: {}", args.spec_dump(), cycle);
    }

    if !inv.complete() {
        return Err("not every cycle can be stitched".into());
    }

    Ok(())
}
