//! Command line options for the stitching tools.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::{
    config::StitchConfig, cycle::Cycle, dump::Dump, errors::StitchErr, policy::MissingPolicy,
    subset::SubsetCode,
};

/// Struct to package up command line arguments.
#[derive(Clone, Debug)]
pub struct CommonCmdLineArgs {
    // Dump whose tank is the starting point, e.g. gdas
    base_dump: Dump,
    // Dump whose tank supplies the selected subsets, e.g. gfs
    spec_dump: Dump,
    // First (or only) cycle to stitch.
    cycle: Cycle,
    // Last cycle when stitching a range.
    through: Option<Cycle>,
    // Only report which tanks are available.
    check: bool,
    // Configuration file merged with overrides from the command line.
    config: StitchConfig,
}

impl CommonCmdLineArgs {
    /// Create a new set of args.
    pub fn new_app(app_name: &'static str, about: &'static str) -> Command {
        Command::new(app_name)
            .about(about)
            .version(env!("CARGO_PKG_VERSION"))
            .arg(
                Arg::new("base-dump")
                    .index(1)
                    .required(true)
                    .help("Dump type of the base tank (e.g. gdas)."),
            )
            .arg(
                Arg::new("spec-dump")
                    .index(2)
                    .required(true)
                    .help("Dump type of the spec tank (e.g. gfs)."),
            )
            .arg(
                Arg::new("date")
                    .index(3)
                    .required(true)
                    .help("Cycle date, YYYYMMDD."),
            )
            .arg(
                Arg::new("hour")
                    .index(4)
                    .required(true)
                    .help("Cycle hour, HH."),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .help("YAML configuration file.")
                    .long_help(concat!(
                        "YAML configuration file. Values given on the command line take ",
                        "precedence over values in the file."
                    )),
            )
            .arg(
                Arg::new("base-root")
                    .long("base-root")
                    .help("Root of the tree holding base tanks."),
            )
            .arg(
                Arg::new("spec-root")
                    .long("spec-root")
                    .help("Root of the tree holding spec tanks."),
            )
            .arg(
                Arg::new("work-dir")
                    .long("work-dir")
                    .help("Where working directories are created.")
                    .long_help("Where working directories are created. Defaults to '${HOME}/bufr-stitch'"),
            )
            .arg(
                Arg::new("output-dir")
                    .long("output-dir")
                    .help("Where the stitched tank is written, defaults to the work directory."),
            )
            .arg(
                Arg::new("splitter")
                    .long("splitter")
                    .help("The splitter executable."),
            )
            .arg(
                Arg::new("tank")
                    .long("tank")
                    .help("Tank name used in file names (e.g. satwnd)."),
            )
            .arg(
                Arg::new("subsets")
                    .short('s')
                    .long("subsets")
                    .num_args(1..)
                    .value_delimiter(',')
                    .help("Subset codes to take from the spec tank (e.g. NC005030)."),
            )
            .arg(
                Arg::new("missing-policy")
                    .short('p')
                    .long("missing-policy")
                    .help("What to do with selected subsets the spec tank lacks: COPY or KILL.")
                    .long_help(concat!(
                        "What to do with selected subsets the spec tank lacks. COPY keeps the base ",
                        "copy, KILL removes the subset from the output. Anything else behaves like ",
                        "COPY with a warning."
                    )),
            )
            .arg(
                Arg::new("through")
                    .short('t')
                    .long("through")
                    .help("Stitch every cycle up to and including this one, YYYYMMDDHH."),
            )
            .arg(
                Arg::new("check")
                    .long("check")
                    .action(ArgAction::SetTrue)
                    .help("List which cycles have both tanks instead of stitching."),
            )
            .after_help(concat!(
                "Tanks are found at ",
                "<root>/<dump>.<YYYYMMDD>/<HH>/atmos/<dump>.t<HH>z.<tank>.tm00.bufr_d\n\n",
                "Set RUST_LOG=info to follow the progress of a run."
            ))
    }

    /// Process a `Command` to get the parsed values out of it and the matches object so an
    /// application can continue with further argument parsing.
    pub fn matches(app: Command) -> Result<(Self, ArgMatches), StitchErr> {
        let matches = app.get_matches();
        let cmd_line_opts = Self::from_matches(&matches)?;

        Ok((cmd_line_opts, matches))
    }

    /// Build the arguments from already parsed matches.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, StitchErr> {
        let required = |name: &'static str| -> Result<&String, StitchErr> {
            matches
                .get_one::<String>(name)
                .ok_or(StitchErr::LogicError("required argument missing"))
        };
        let path = |name: &str| matches.get_one::<String>(name).map(PathBuf::from);

        let mut config = match matches.get_one::<String>("config") {
            Some(config_path) => StitchConfig::load(config_path)?,
            None => StitchConfig::default(),
        };

        if let Some(root) = path("base-root") {
            config.base_root = root;
        }
        if let Some(root) = path("spec-root") {
            config.spec_root = root;
        }
        if let Some(dir) = path("work-dir") {
            config.work_root = dir;
        }
        if let Some(dir) = path("output-dir") {
            config.output_dir = Some(dir);
        }
        if let Some(exe) = path("splitter") {
            config.splitter = exe;
        }
        if let Some(tank) = matches.get_one::<String>("tank") {
            config.tank = tank.to_owned();
        }
        if let Some(codes) = matches.get_many::<String>("subsets") {
            config.subsets = codes
                .map(|code| SubsetCode::new(code))
                .collect::<Result<_, _>>()?;
        }
        if let Some(policy) = matches.get_one::<String>("missing-policy") {
            config.missing_policy = MissingPolicy::parse_lenient(policy);
        }
        config.validate()?;

        let base_dump = Dump::new(required("base-dump")?)?;
        let spec_dump = Dump::new(required("spec-dump")?)?;
        let cycle = Cycle::new(required("date")?, required("hour")?)?;

        let through = matches
            .get_one::<String>("through")
            .map(|val| val.parse::<Cycle>())
            .transpose()?;

        if let Some(last) = through {
            if last < cycle {
                return Err(StitchErr::InvalidCycle(format!(
                    "--through {} is before {}",
                    last, cycle
                )));
            }
        }

        Ok(CommonCmdLineArgs {
            base_dump,
            spec_dump,
            cycle,
            through,
            check: matches.get_flag("check"),
            config,
        })
    }

    /// Get the base dump.
    pub fn base_dump(&self) -> &Dump {
        &self.base_dump
    }

    /// Get the spec dump.
    pub fn spec_dump(&self) -> &Dump {
        &self.spec_dump
    }

    /// Get the first cycle.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Get the last cycle, if a range was requested.
    pub fn through(&self) -> Option<Cycle> {
        self.through
    }

    /// Whether to only check for tanks.
    pub fn check(&self) -> bool {
        self.check
    }

    /// Get the configuration.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }
}
