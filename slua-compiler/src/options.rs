use serde::{Deserialize, Serialize};

const MAX_LEVEL: u8 = 2;

/// Per-call compiler settings. Levels above 2 behave as 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub optimization_level: u8,
    pub debug_level: u8,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            optimization_level: 1,
            debug_level: 1,
        }
    }
}

impl CompileOptions {
    pub fn new(optimization_level: u8, debug_level: u8) -> Self {
        CompileOptions { optimization_level, debug_level }.clamped()
    }

    pub fn clamped(self) -> Self {
        CompileOptions {
            optimization_level: self.optimization_level.min(MAX_LEVEL),
            debug_level: self.debug_level.min(MAX_LEVEL),
        }
    }

    pub fn folds_constants(&self) -> bool {
        self.optimization_level >= 1
    }

    pub fn line_info(&self) -> bool {
        self.debug_level >= 1
    }

    pub fn local_names(&self) -> bool {
        self.debug_level >= 2
    }
}
