//! Stitching the subsets of two tanks together.

use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;

use crate::{
    config::StitchConfig,
    cycle::Cycle,
    dump::{Dump, DumpId},
    errors::StitchErr,
    splitter::{ExternalSplitter, Splitter},
    subset::SubsetCode,
    tank::TankLayout,
};

mod merge;
mod workdir;

use self::workdir::{LockFile, WorkDir};

/// Summary of a completed run.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StitchReport {
    pub output: PathBuf,
    /// Subsets in the output that came from the base tank.
    pub from_base: Vec<SubsetCode>,
    /// Subsets in the output that came from the spec tank.
    pub from_spec: Vec<SubsetCode>,
    /// Selected subsets the spec tank did not have.
    pub missing_in_spec: Vec<SubsetCode>,
    /// Base subsets removed because of the missing policy.
    pub dropped: Vec<SubsetCode>,
    pub bytes_written: u64,
}

// The two tanks taking part in a run. Also the names of their directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, IntoStaticStr)]
enum Side {
    #[strum(serialize = "base")]
    Base,
    #[strum(serialize = "spec")]
    Spec,
}

impl Side {
    fn dir_name(self) -> &'static str {
        self.into()
    }
}

/// Combines a base tank and a spec tank, taking the selected subsets from the spec tank.
#[derive(Debug)]
pub struct Stitcher<S = ExternalSplitter> {
    config: StitchConfig,
    splitter: S,
}

impl Stitcher<ExternalSplitter> {
    /// Create a stitcher that runs the splitter executable named in the configuration.
    pub fn new(config: StitchConfig) -> Result<Self, StitchErr> {
        let splitter = ExternalSplitter::new(&config.splitter);
        Self::with_splitter(config, splitter)
    }
}

impl<S: Splitter> Stitcher<S> {
    const SOURCES_DIR: &'static str = "sources";
    const MERGE_DIR: &'static str = "merge";
    const BIN_DIR: &'static str = "bin";

    /// Create a stitcher with any splitter.
    pub fn with_splitter(config: StitchConfig, splitter: S) -> Result<Self, StitchErr> {
        config.validate()?;
        Ok(Stitcher { config, splitter })
    }

    /// Where the stitched tank for this base dump is written.
    pub fn output_path(&self, base: &DumpId) -> PathBuf {
        let file_name = TankLayout::new(&self.config.base_root, &self.config.tank).file_name(base);
        self.config.output_dir().join(file_name)
    }

    pub(crate) fn run_dir_name(base_dump: &Dump, spec_dump: &Dump, cycle: Cycle) -> String {
        // Dots never appear in dump names, so this cannot collide for different pairs.
        format!("{}.{}.{}", base_dump, spec_dump, cycle)
    }

    // Hidden file next to the output, `.<output name>.lock`.
    fn output_lock_path(output: &Path) -> Result<PathBuf, StitchErr> {
        let file_name = output
            .file_name()
            .ok_or(StitchErr::LogicError("output path has no file name"))?;

        let mut lock_name = std::ffi::OsString::from(".");
        lock_name.push(file_name);
        lock_name.push(".lock");

        Ok(output.with_file_name(lock_name))
    }

    /// Stitch the tanks of two dumps for one cycle.
    ///
    /// Every base subset ends up in the output, except that the selected subsets are replaced
    /// by their spec copies. Selected subsets missing from the spec tank are handled by the
    /// missing policy. The working directory is removed before returning, whether the run
    /// succeeded or not.
    ///
    /// Only one run at a time may write a given output file. Another run writing it, even for a
    /// different spec dump, makes this one fail with `OutputBusy` before any work is done.
    pub fn stitch(
        &self,
        base_dump: &Dump,
        spec_dump: &Dump,
        cycle: Cycle,
    ) -> Result<StitchReport, StitchErr> {
        let base = DumpId::new(base_dump.clone(), cycle);
        let spec = DumpId::new(spec_dump.clone(), cycle);

        let base_layout = TankLayout::new(&self.config.base_root, &self.config.tank);
        let spec_layout = TankLayout::new(&self.config.spec_root, &self.config.tank);

        let base_tank = base_layout
            .find(&base)
            .ok_or_else(|| StitchErr::MissingBaseTank(base_layout.path(&base)))?;
        let spec_tank = spec_layout
            .find(&spec)
            .ok_or_else(|| StitchErr::MissingSpecTank(spec_layout.path(&spec)))?;

        log::info!("Stitching {} into {}.", spec, base);

        let output = self.output_path(&base);
        std::fs::create_dir_all(self.config.output_dir())?;
        let _output_lock = LockFile::try_acquire(Self::output_lock_path(&output)?)?
            .ok_or_else(|| StitchErr::OutputBusy(output.clone()))?;

        let work = WorkDir::acquire(
            &self.config.work_root,
            &Self::run_dir_name(base_dump, spec_dump, cycle),
        )?;
        let splitter = self.splitter.stage(&work.sub_dir(Self::BIN_DIR)?)?;

        for side in Side::iter() {
            let tank = match side {
                Side::Base => &base_tank,
                Side::Spec => &spec_tank,
            };

            let source_dir = work.sub_dir(Path::new(Self::SOURCES_DIR).join(side.dir_name()))?;
            let file_name = tank
                .file_name()
                .ok_or(StitchErr::LogicError("tank path has no file name"))?;
            let source = source_dir.join(file_name);
            std::fs::copy(tank, &source)?;

            splitter.split(&source, &work.sub_dir(side.dir_name())?)?;
        }

        let merge_dir = work.sub_dir(Self::MERGE_DIR)?;
        let outcome = merge::merge(
            &work.path().join(Side::Base.dir_name()),
            &work.path().join(Side::Spec.dir_name()),
            &merge_dir,
            &self.config.subsets,
            &self.config.missing_policy,
        )?;

        let bytes_written = merge::concatenate(&merge_dir, &output)?;

        drop(work);
        log::info!("Wrote {} ({} bytes).", output.display(), bytes_written);

        Ok(StitchReport {
            output,
            from_base: outcome.from_base,
            from_spec: outcome.from_spec,
            missing_in_spec: outcome.missing_in_spec,
            dropped: outcome.dropped,
            bytes_written,
        })
    }

    /// Stitch every cycle from `first` to `last`, inclusive, one after the other.
    ///
    /// A failed cycle does not stop the others, the result of each is returned.
    pub fn stitch_range(
        &self,
        base_dump: &Dump,
        spec_dump: &Dump,
        first: Cycle,
        last: Cycle,
    ) -> Vec<(Cycle, Result<StitchReport, StitchErr>)> {
        Cycle::all_between(first, last, self.config.hours_between_cycles)
            .map(|cycle| {
                let result = self.stitch(base_dump, spec_dump, cycle);
                if let Err(ref err) = result {
                    log::error!("Cycle {} failed: {}", cycle, err);
                }
                (cycle, result)
            })
            .collect()
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::policy::MissingPolicy;

    use std::{
        io::Write,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use tempdir::TempDir;

    // Splits text tanks made of `CODE:payload` lines, appending each payload to a file named CODE.
    #[derive(Clone, Debug, Default)]
    struct LineSplitter {
        staged: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Splitter for LineSplitter {
        fn stage(&self, bin_dir: &Path) -> Result<Self, StitchErr> {
            assert!(bin_dir.is_dir());
            self.staged.fetch_add(1, Ordering::SeqCst);
            Ok(self.clone())
        }

        fn split(&self, input: &Path, out_dir: &Path) -> Result<(), StitchErr> {
            if self.fail {
                return Err(StitchErr::LogicError("splitter told to fail"));
            }

            let text = std::fs::read_to_string(input)?;
            for line in text.lines() {
                let (code, payload) = line
                    .split_once(':')
                    .ok_or(StitchErr::LogicError("bad test tank line"))?;
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(out_dir.join(code))?;
                writeln!(file, "{}", payload)?;
            }

            Ok(())
        }
    }

    // struct to hold temporary data for tests.
    struct TestTree {
        tmp: TempDir,
        config: StitchConfig,
    }

    fn create_test_tree(subsets: &[&str], missing_policy: MissingPolicy) -> TestTree {
        let tmp = TempDir::new("bufr-stitch-test-tree").expect("Failed to create temp dir.");

        let config = StitchConfig {
            base_root: tmp.path().join("ops"),
            spec_root: tmp.path().join("exp"),
            work_root: tmp.path().join("work"),
            subsets: subsets.iter().map(|c| SubsetCode::new(c).unwrap()).collect(),
            missing_policy,
            ..StitchConfig::default()
        };

        TestTree { tmp, config }
    }

    fn dump(name: &str) -> Dump {
        Dump::new(name).unwrap()
    }

    fn cycle(s: &str) -> Cycle {
        s.parse().unwrap()
    }

    fn write_tank(root: &Path, dump_name: &str, cyc: Cycle, lines: &[&str]) {
        let id = DumpId::new(dump(dump_name), cyc);
        let path = TankLayout::new(root, "satwnd").path(&id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut text = String::new();
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        std::fs::write(path, text).unwrap();
    }

    // Both tanks for 2023091500, base has three subsets and spec has two.
    fn fill_test_tree(tree: &TestTree, cyc: Cycle) {
        write_tank(
            &tree.config.base_root,
            "gdas",
            cyc,
            &["NC005030:base 30", "NC005031:base 31", "NC005032:base 32"],
        );
        write_tank(
            &tree.config.spec_root,
            "gfs",
            cyc,
            &["NC005031:spec 31", "NC005034:spec 34"],
        );
    }

    fn work_root_entries(tree: &TestTree) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(&tree.config.work_root) {
            Ok(iter) => iter.map(|e| e.unwrap().path()).collect(),
            Err(_) => vec![],
        };
        entries.sort();
        entries
    }

    fn stitch_one(tree: &TestTree) -> Result<StitchReport, StitchErr> {
        let stitcher =
            Stitcher::with_splitter(tree.config.clone(), LineSplitter::default()).unwrap();
        stitcher.stitch(&dump("gdas"), &dump("gfs"), cycle("2023091500"))
    }

    #[test]
    fn test_selected_subsets_come_from_spec() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));

        let report = stitch_one(&tree).expect("Stitching failed.");

        assert_eq!(
            report.output,
            tree.config.work_root.join("gdas.t00z.satwnd.tm00.bufr_d")
        );
        assert_eq!(
            std::fs::read_to_string(&report.output).unwrap(),
            "base 30\nspec 31\nbase 32\n"
        );
        assert_eq!(report.bytes_written, 24);
        assert_eq!(report.from_spec.len(), 1);
        assert_eq!(report.from_base.len(), 2);

        // Only the output is left behind.
        assert_eq!(work_root_entries(&tree), vec![report.output.clone()]);
    }

    #[test]
    fn test_missing_spec_subset_dropped() {
        let tree = create_test_tree(&["NC005031", "NC005032"], MissingPolicy::DropEntirely);
        fill_test_tree(&tree, cycle("2023091500"));

        let report = stitch_one(&tree).expect("Stitching failed.");

        assert_eq!(
            std::fs::read_to_string(&report.output).unwrap(),
            "base 30\nspec 31\n"
        );
        assert_eq!(report.dropped, vec![SubsetCode::new("NC005032").unwrap()]);
        assert_eq!(work_root_entries(&tree), vec![report.output.clone()]);
    }

    #[test]
    fn test_missing_spec_subset_copied() {
        for policy in vec![
            MissingPolicy::CopyFromBase,
            MissingPolicy::Unrecognized("MAYBE".to_owned()),
        ] {
            let tree = create_test_tree(&["NC005032", "NC005099"], policy);
            fill_test_tree(&tree, cycle("2023091500"));

            let report = stitch_one(&tree).expect("Stitching failed.");

            assert_eq!(
                std::fs::read_to_string(&report.output).unwrap(),
                "base 30\nbase 31\nbase 32\n"
            );
            assert_eq!(report.missing_in_spec.len(), 2);
            assert!(report.dropped.is_empty());
            assert!(report.from_spec.is_empty());
        }
    }

    #[test]
    fn test_separate_output_dir() {
        let mut tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        tree.config.output_dir = Some(tree.tmp.path().join("out"));
        fill_test_tree(&tree, cycle("2023091500"));

        let report = stitch_one(&tree).expect("Stitching failed.");

        assert_eq!(
            report.output,
            tree.tmp.path().join("out").join("gdas.t00z.satwnd.tm00.bufr_d")
        );
        assert!(report.output.is_file());
        assert!(work_root_entries(&tree).is_empty());
    }

    #[test]
    fn test_repeat_runs_match() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));

        let first = stitch_one(&tree).expect("Stitching failed.");
        let first_bytes = std::fs::read(&first.output).unwrap();
        let second = stitch_one(&tree).expect("Stitching failed.");

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second.output).unwrap(), first_bytes);
    }

    #[test]
    fn test_missing_base_tank() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        write_tank(&tree.config.spec_root, "gfs", cycle("2023091500"), &["NC005031:x"]);

        let splitter = LineSplitter::default();
        let stitcher = Stitcher::with_splitter(tree.config.clone(), splitter.clone()).unwrap();

        match stitcher.stitch(&dump("gdas"), &dump("gfs"), cycle("2023091500")) {
            Err(StitchErr::MissingBaseTank(path)) => assert!(path.ends_with(
                "gdas.20230915/00/atmos/gdas.t00z.satwnd.tm00.bufr_d"
            )),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(splitter.staged.load(Ordering::SeqCst), 0);
        assert!(work_root_entries(&tree).is_empty());
    }

    #[test]
    fn test_missing_spec_tank() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        write_tank(&tree.config.base_root, "gdas", cycle("2023091500"), &["NC005031:x"]);

        match stitch_one(&tree) {
            Err(StitchErr::MissingSpecTank(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(work_root_entries(&tree).is_empty());
    }

    #[test]
    fn test_missing_splitter() {
        let mut tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        tree.config.splitter = tree.tmp.path().join("bin").join("split_by_subset");
        fill_test_tree(&tree, cycle("2023091500"));

        let stitcher = Stitcher::new(tree.config.clone()).unwrap();
        match stitcher.stitch(&dump("gdas"), &dump("gfs"), cycle("2023091500")) {
            Err(StitchErr::MissingSplitter(path)) => assert_eq!(path, tree.config.splitter),
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(work_root_entries(&tree).is_empty());
    }

    #[test]
    fn test_failed_split_cleans_up() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));

        let splitter = LineSplitter {
            fail: true,
            ..LineSplitter::default()
        };
        let stitcher = Stitcher::with_splitter(tree.config.clone(), splitter).unwrap();

        assert!(stitcher
            .stitch(&dump("gdas"), &dump("gfs"), cycle("2023091500"))
            .is_err());
        assert!(work_root_entries(&tree).is_empty());
    }

    #[test]
    fn test_busy_work_dir() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));

        let run_dir = tree.config.work_root.join(Stitcher::<LineSplitter>::run_dir_name(
            &dump("gdas"),
            &dump("gfs"),
            cycle("2023091500"),
        ));
        std::fs::create_dir_all(&run_dir).unwrap();
        std::fs::write(run_dir.join(".lock"), b"").unwrap();

        match stitch_one(&tree) {
            Err(StitchErr::WorkDirBusy(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(run_dir.join(".lock").exists());
        assert!(!tree
            .config
            .work_root
            .join("gdas.t00z.satwnd.tm00.bufr_d")
            .exists());
    }

    #[test]
    fn test_stitch_range() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));
        fill_test_tree(&tree, cycle("2023091506"));
        write_tank(&tree.config.base_root, "gdas", cycle("2023091512"), &["NC005031:x"]);

        let stitcher =
            Stitcher::with_splitter(tree.config.clone(), LineSplitter::default()).unwrap();
        let results = stitcher.stitch_range(
            &dump("gdas"),
            &dump("gfs"),
            cycle("2023091500"),
            cycle("2023091512"),
        );

        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_ok());
        match results[2] {
            (cyc, Err(StitchErr::MissingSpecTank(_))) => assert_eq!(cyc, cycle("2023091512")),
            ref other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(
            work_root_entries(&tree),
            vec![
                tree.config.work_root.join("gdas.t00z.satwnd.tm00.bufr_d"),
                tree.config.work_root.join("gdas.t06z.satwnd.tm00.bufr_d"),
            ]
        );
    }

    #[test]
    fn test_busy_output() {
        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));

        let output = tree.config.work_root.join("gdas.t00z.satwnd.tm00.bufr_d");
        let lock = tree.config.work_root.join(".gdas.t00z.satwnd.tm00.bufr_d.lock");
        std::fs::create_dir_all(&tree.config.work_root).unwrap();
        std::fs::write(&lock, b"").unwrap();

        match stitch_one(&tree) {
            Err(StitchErr::OutputBusy(path)) => assert_eq!(path, output),
            other => panic!("unexpected result: {:?}", other),
        }

        // Nothing was started, and the other run's lock is still in place.
        assert_eq!(work_root_entries(&tree), vec![lock.clone()]);

        std::fs::remove_file(&lock).unwrap();
        let report = stitch_one(&tree).expect("Stitching failed.");
        assert_eq!(work_root_entries(&tree), vec![report.output]);
    }

    #[test]
    fn test_concurrent_spec_dumps_share_output() {
        const LINES: usize = 10_000;

        let expected = |spec_name: &str| {
            let mut text = String::from("base 30\n");
            for _ in 0..LINES {
                text.push_str(&format!("{} 31\n", spec_name));
            }
            text.push_str("base 32\n");
            text
        };

        let tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        let cyc = cycle("2023091500");
        write_tank(
            &tree.config.base_root,
            "gdas",
            cyc,
            &["NC005030:base 30", "NC005031:base 31", "NC005032:base 32"],
        );
        for spec_name in &["gfsa", "gfsb"] {
            let line = format!("NC005031:{} 31", spec_name);
            let lines: Vec<&str> = std::iter::repeat(line.as_str()).take(LINES).collect();
            write_tank(&tree.config.spec_root, spec_name, cyc, &lines);
        }

        for _ in 0..4 {
            let handles: Vec<_> = ["gfsa", "gfsb"]
                .iter()
                .map(|spec_name| {
                    let config = tree.config.clone();
                    let spec_dump = dump(spec_name);
                    std::thread::spawn(move || {
                        let stitcher =
                            Stitcher::with_splitter(config, LineSplitter::default()).unwrap();
                        stitcher.stitch(&dump("gdas"), &spec_dump, cyc)
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let mut wrote = vec![];
            for (spec_name, result) in ["gfsa", "gfsb"].iter().zip(results) {
                match result {
                    Ok(report) => wrote.push((*spec_name, report)),
                    Err(StitchErr::OutputBusy(_)) => {}
                    Err(err) => panic!("unexpected error: {}", err),
                }
            }
            assert!(!wrote.is_empty());

            // Whoever wrote last, the file is one whole run's output and never a mix of both.
            let text = std::fs::read_to_string(&wrote[0].1.output).unwrap();
            assert!(wrote
                .iter()
                .any(|(spec_name, _)| text == expected(*spec_name)));

            assert_eq!(work_root_entries(&tree), vec![wrote[0].1.output.clone()]);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_splitter_named_like_run_dir() {
        use std::os::unix::fs::PermissionsExt;

        let mut tree = create_test_tree(&["NC005031"], MissingPolicy::CopyFromBase);
        fill_test_tree(&tree, cycle("2023091500"));

        // Same name as the merge directory of the run.
        let tools = tree.tmp.path().join("tools");
        std::fs::create_dir_all(&tools).unwrap();
        let exe = tools.join("merge");
        std::fs::write(
            &exe,
            "#!/bin/sh\nwhile IFS=: read -r code body; do\n  printf '%s\\n' \"$body\" >> \"$code\"\ndone < \"$1\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        tree.config.splitter = exe;

        let stitcher = Stitcher::new(tree.config.clone()).unwrap();
        let report = stitcher
            .stitch(&dump("gdas"), &dump("gfs"), cycle("2023091500"))
            .expect("Stitching failed.");

        assert_eq!(
            std::fs::read_to_string(&report.output).unwrap(),
            "base 30\nspec 31\nbase 32\n"
        );
        assert_eq!(work_root_entries(&tree), vec![report.output.clone()]);
    }
}
