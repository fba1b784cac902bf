//! Combining the subset files from both tanks and writing the stitched tank.

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{errors::StitchErr, policy::MissingPolicy, subset::SubsetCode};

/// What happened to each subset while merging.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MergeOutcome {
    pub(crate) from_base: Vec<SubsetCode>,
    pub(crate) from_spec: Vec<SubsetCode>,
    pub(crate) missing_in_spec: Vec<SubsetCode>,
    pub(crate) dropped: Vec<SubsetCode>,
}

/// List the subset files in a directory, sorted by code.
///
/// Anything not named like a subset code is skipped.
pub(crate) fn list_subsets(dir: &Path) -> Result<Vec<(SubsetCode, PathBuf)>, StitchErr> {
    let mut subsets = vec![];

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        match SubsetCode::from_file_name(&path) {
            Some(code) => subsets.push((code, path)),
            None => log::debug!("Ignoring non-subset file {}", path.display()),
        }
    }

    subsets.sort();
    Ok(subsets)
}

/// Fill `merge_dir` with every base subset, then replace or drop the selected ones.
pub(crate) fn merge(
    base_dir: &Path,
    spec_dir: &Path,
    merge_dir: &Path,
    selection: &[SubsetCode],
    policy: &MissingPolicy,
) -> Result<MergeOutcome, StitchErr> {
    for (code, path) in list_subsets(base_dir)? {
        std::fs::copy(&path, merge_dir.join(&code))?;
    }

    let spec_subsets: HashMap<SubsetCode, PathBuf> = list_subsets(spec_dir)?.into_iter().collect();

    let mut outcome = MergeOutcome::default();
    let mut seen = HashSet::new();

    for code in selection.iter().filter(|code| seen.insert(*code)) {
        let target = merge_dir.join(code);

        if let Some(spec_path) = spec_subsets.get(code) {
            log::info!("Taking {} from the spec tank.", code);
            std::fs::copy(spec_path, &target)?;
            outcome.from_spec.push(code.clone());
            continue;
        }

        log::info!("{} is not in the spec tank, applying missing policy {}.", code, policy);
        outcome.missing_in_spec.push(code.clone());

        if policy.drops_missing() {
            if target.is_file() {
                std::fs::remove_file(&target)?;
                outcome.dropped.push(code.clone());
            }
        } else if let MissingPolicy::Unrecognized(value) = policy {
            log::warn!(
                "Unrecognized missing policy {:?}, keeping the base copy of {} if any.",
                value,
                code
            );
        }
    }

    let from_spec: HashSet<&SubsetCode> = outcome.from_spec.iter().collect();
    outcome.from_base = list_subsets(merge_dir)?
        .into_iter()
        .map(|(code, _)| code)
        .filter(|code| !from_spec.contains(code))
        .collect();

    Ok(outcome)
}

/// Concatenate every subset file in `merge_dir` into `output`. Returns the bytes written.
///
/// The data goes to a uniquely named temporary file next to `output` that is renamed into place
/// once complete, so a failed run never leaves a partial `output` behind.
pub(crate) fn concatenate(merge_dir: &Path, output: &Path) -> Result<u64, StitchErr> {
    let dir = output
        .parent()
        .ok_or(StitchErr::LogicError("output path has no directory"))?;

    let mut partial = tempfile::Builder::new()
        .prefix(".bufr-stitch-")
        .suffix(".partial")
        .tempfile_in(dir)?;

    let bytes = write_all_subsets(merge_dir, partial.as_file_mut())?;
    partial.persist(output).map_err(|err| err.error)?;

    Ok(bytes)
}

fn write_all_subsets(merge_dir: &Path, dest: &mut File) -> Result<u64, StitchErr> {
    let mut writer = BufWriter::new(dest);
    let mut bytes = 0;

    for (code, path) in list_subsets(merge_dir)? {
        let mut subset = File::open(&path)?;
        let n = std::io::copy(&mut subset, &mut writer)?;
        log::debug!("Appended {} ({} bytes)", code, n);
        bytes += n;
    }

    writer.flush()?;
    Ok(bytes)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
