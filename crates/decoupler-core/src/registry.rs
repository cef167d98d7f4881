//! Closed method registry.
//!
//! One implementation per [`MethodKind`], all five required at construction,
//! so a resolved kind can never miss its method at dispatch time.

use crate::method::{ActivityMethod, MethodKind, MockMethod};

/// Registry mapping each method kind to its implementation.
pub struct MethodRegistry {
    wmean: Box<dyn ActivityMethod>,
    wsum: Box<dyn ActivityMethod>,
    ulm: Box<dyn ActivityMethod>,
    mlm: Box<dyn ActivityMethod>,
    ora: Box<dyn ActivityMethod>,
}

impl MethodRegistry {
    pub fn new(
        wmean: Box<dyn ActivityMethod>,
        wsum: Box<dyn ActivityMethod>,
        ulm: Box<dyn ActivityMethod>,
        mlm: Box<dyn ActivityMethod>,
        ora: Box<dyn ActivityMethod>,
    ) -> Self {
        Self {
            wmean,
            wsum,
            ulm,
            mlm,
            ora,
        }
    }

    /// Registry backed by deterministic mock methods, for tests and demos.
    pub fn mocked() -> Self {
        Self::new(
            Box::new(MockMethod::new("wmean")),
            Box::new(MockMethod::new("wsum")),
            Box::new(MockMethod::new("ulm")),
            Box::new(MockMethod::new("mlm")),
            Box::new(MockMethod::new("ora")),
        )
    }

    pub fn get(&self, kind: MethodKind) -> &dyn ActivityMethod {
        match kind {
            MethodKind::Wmean => self.wmean.as_ref(),
            MethodKind::Wsum => self.wsum.as_ref(),
            MethodKind::Ulm => self.ulm.as_ref(),
            MethodKind::Mlm => self.mlm.as_ref(),
            MethodKind::Ora => self.ora.as_ref(),
        }
    }
}
