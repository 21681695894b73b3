//! Built-in EEP profile catalog.
//!
//! Each [`ProfileHandler`] pairs a profile table for the decode engine with
//! the capabilities created for devices using that profile.

use std::sync::Arc;

use enocean_protocol::eep::EepDataField;
use enocean_protocol::{Address, EepId, EepSpecification};

use crate::capability::{
    Capability, CapabilityFactory, CapabilityOptions, CoverCapability, MetaDataCapability, MeterCapability,
    PushButtonCapability, ScalarCapability,
};
use crate::state_change::StateSink;

mod blinds;
mod central_command;
mod fan;
mod four_bs;
mod rocker;

/// Decode handler for one EEP.
#[derive(Clone)]
pub struct ProfileHandler {
    pub specification: Arc<EepSpecification>,
    pub capability_factories: Vec<CapabilityFactory>,
}

impl std::fmt::Debug for ProfileHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileHandler")
            .field("eep", &self.specification.eep_id())
            .field("name", &self.specification.name())
            .field("capabilities", &self.capability_factories.len())
            .finish()
    }
}

impl ProfileHandler {
    pub fn new(specification: impl Into<EepSpecification>) -> Self {
        Self {
            specification: Arc::new(specification.into()),
            capability_factories: Vec::new(),
        }
    }

    pub fn with_capability(mut self, factory: CapabilityFactory) -> Self {
        self.capability_factories.push(factory);
        self
    }

    pub fn eep_id(&self) -> EepId {
        self.specification.eep_id()
    }

    /// Instantiate the capabilities for a newly registered device.
    pub fn create_capabilities(
        &self,
        address: Address,
        sink: &StateSink,
        options: &CapabilityOptions,
    ) -> Vec<Box<dyn Capability>> {
        self.capability_factories
            .iter()
            .map(|factory| factory(address, Arc::clone(sink), options))
            .collect()
    }
}

/// All profiles known out of the box.
pub fn catalog() -> Vec<ProfileHandler> {
    let mut handlers = vec![rocker::f6_02_01()];
    handlers.extend(four_bs::handlers());
    handlers.push(central_command::a5_38_08());
    handlers.push(blinds::d2_05_00());
    handlers.push(fan::d2_20_02());
    handlers
}

/// Look up a built-in profile.
pub fn find(eep: EepId) -> Option<ProfileHandler> {
    let handler = match (eep.rorg, eep.func, eep.type_) {
        (0xF6, 0x02, 0x01) => rocker::f6_02_01(),
        (0xA5, 0x38, 0x08) => central_command::a5_38_08(),
        (0xD2, 0x05, 0x00) => blinds::d2_05_00(),
        (0xD2, 0x20, 0x02) => fan::d2_20_02(),
        (0xA5, ..) => return four_bs::find(eep),
        _ => return None,
    };
    Some(handler)
}

fn scalar(observable_uid: &'static str) -> CapabilityFactory {
    Arc::new(
        move |address: Address, sink: StateSink, _: &CapabilityOptions| -> Box<dyn Capability> {
            Box::new(ScalarCapability::new(address, observable_uid, sink))
        },
    )
}

fn metadata() -> CapabilityFactory {
    Arc::new(|address: Address, sink: StateSink, _: &CapabilityOptions| -> Box<dyn Capability> {
        Box::new(MetaDataCapability::new(address, sink))
    })
}

fn push_button() -> CapabilityFactory {
    Arc::new(|address: Address, sink: StateSink, _: &CapabilityOptions| -> Box<dyn Capability> {
        Box::new(PushButtonCapability::new(address, sink))
    })
}

fn meter() -> CapabilityFactory {
    Arc::new(|address: Address, sink: StateSink, _: &CapabilityOptions| -> Box<dyn Capability> {
        Box::new(MeterCapability::new(address, sink))
    })
}

fn cover() -> CapabilityFactory {
    Arc::new(|address: Address, sink: StateSink, options: &CapabilityOptions| -> Box<dyn Capability> {
        Box::new(CoverCapability::with_watchdog(address, sink, options.cover_watchdog))
    })
}

/// 4BS learn bit (DB0.3).
fn lrnb() -> EepDataField {
    EepDataField::new("LRNB", "LRN bit", 28, 1)
        .enumeration([(0, "Teach-in telegram"), (1, "Data telegram")])
        .default_raw(1)
}
