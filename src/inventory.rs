use crate::{
    config::StitchConfig,
    cycle::Cycle,
    dump::{Dump, DumpId},
    errors::StitchErr,
    tank::TankLayout,
};

/// Inventory lists which cycles between the first and last have both tanks available to stitch.
/// It also lists the cycles missing a base or spec tank, a cycle missing both is in both lists.
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq)]
pub struct Inventory {
    pub first: Cycle,
    pub last: Cycle,
    pub ready: Vec<Cycle>,
    pub missing_base: Vec<Cycle>,
    pub missing_spec: Vec<Cycle>,
}

impl Inventory {
    /// Check for the base and spec tanks of every cycle from `first` to `last`, inclusive.
    pub fn scan(
        config: &StitchConfig,
        base_dump: &Dump,
        spec_dump: &Dump,
        first: Cycle,
        last: Cycle,
    ) -> Result<Self, StitchErr> {
        if first > last {
            return Err(StitchErr::InvalidCycle(format!(
                "{} is after {}",
                first, last
            )));
        }

        let base_layout = TankLayout::new(&config.base_root, &config.tank);
        let spec_layout = TankLayout::new(&config.spec_root, &config.tank);

        let mut ready = vec![];
        let mut missing_base = vec![];
        let mut missing_spec = vec![];

        for cycle in Cycle::all_between(first, last, config.hours_between_cycles) {
            let has_base = base_layout
                .find(&DumpId::new(base_dump.clone(), cycle))
                .is_some();
            let has_spec = spec_layout
                .find(&DumpId::new(spec_dump.clone(), cycle))
                .is_some();

            if !has_base {
                missing_base.push(cycle);
            }
            if !has_spec {
                missing_spec.push(cycle);
            }
            if has_base && has_spec {
                ready.push(cycle);
            }
        }

        Ok(Inventory {
            first,
            last,
            ready,
            missing_base,
            missing_spec,
        })
    }

    /// Return true if every cycle in the range can be stitched.
    pub fn complete(&self) -> bool {
        self.missing_base.is_empty() && self.missing_spec.is_empty()
    }
}
