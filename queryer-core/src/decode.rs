// Query document decoding
// Source-form entry points. Text, byte slices, open streams and files are
// decoded with serde_json and the resulting value tree is handed to the
// grammar compiler; JSON syntax problems and grammar violations stay
// distinguishable through CompileError.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::CompileError;
use crate::grammar::{GrammarCompiler, Queryer};

impl GrammarCompiler<'_> {
    /// Compile a query expression from JSON text.
    pub fn compile_str(&self, json: &str) -> Result<Box<dyn Queryer>, CompileError> {
        let expr: Value = serde_json::from_str(json)?;
        Ok(self.compile(&expr)?)
    }

    /// Compile a query expression from raw JSON bytes.
    pub fn compile_slice(&self, json: &[u8]) -> Result<Box<dyn Queryer>, CompileError> {
        let expr: Value = serde_json::from_slice(json)?;
        Ok(self.compile(&expr)?)
    }

    /// Compile a query expression read from an open stream.
    pub fn compile_reader(&self, json: impl Read) -> Result<Box<dyn Queryer>, CompileError> {
        let expr: Value = serde_json::from_reader(json)?;
        Ok(self.compile(&expr)?)
    }

    /// Compile a query expression from a JSON file on disk.
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<Box<dyn Queryer>, CompileError> {
        debug!("Compiling query document from {}", path.as_ref().display());
        let file = File::open(path)?;
        self.compile_reader(BufReader::new(file))
    }
}

/// Compile JSON text with the built-in variants.
pub fn compile_str(json: &str) -> Result<Box<dyn Queryer>, CompileError> {
    GrammarCompiler::new(crate::default_registry()).compile_str(json)
}

/// Compile raw JSON bytes with the built-in variants.
pub fn compile_slice(json: &[u8]) -> Result<Box<dyn Queryer>, CompileError> {
    GrammarCompiler::new(crate::default_registry()).compile_slice(json)
}

/// Compile an open JSON stream with the built-in variants.
pub fn compile_reader(json: impl Read) -> Result<Box<dyn Queryer>, CompileError> {
    GrammarCompiler::new(crate::default_registry()).compile_reader(json)
}

/// Compile a JSON file on disk with the built-in variants.
pub fn compile_file(path: impl AsRef<Path>) -> Result<Box<dyn Queryer>, CompileError> {
    GrammarCompiler::new(crate::default_registry()).compile_file(path)
}
