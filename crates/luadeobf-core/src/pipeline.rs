//! Pass ordering and execution
//!
//! The order is fixed:
//!
//! 1. literal resolution (introduces `_resolved` names)
//! 2. base64 literals
//! 3. loadstring rewrite (needs the `_resolved` names from 1)
//! 4. identifier renaming (skips the `_resolved` names from 1)
//! 5. arithmetic folding (optional)
//! 6. beautify (last, so indentation reflects the final text)

use tracing::{debug, info_span};

use crate::config::DeobfConfig;
use crate::error::Result;
use crate::passes::{
    ArithmeticFoldingPass, Base64LiteralPass, BeautifyPass, IdentifierRenamePass,
    LiteralResolverPass, LoadstringRewritePass, TextPass,
};

/// Whether a pass changed the text during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub name: &'static str,
    pub changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub passes: Vec<PassOutcome>,
}

impl PipelineReport {
    pub fn changed_passes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().filter(|p| p.changed).map(|p| p.name)
    }
}

pub struct Pipeline {
    passes: Vec<Box<dyn TextPass>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::build(&DeobfConfig::default())
    }
}

impl Pipeline {
    /// Build the pipeline for a validated copy of `config`
    pub fn from_config(config: &DeobfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &DeobfConfig) -> Self {
        let mut passes: Vec<Box<dyn TextPass>> = vec![
            Box::new(LiteralResolverPass::new()),
            Box::new(Base64LiteralPass::new()),
            Box::new(LoadstringRewritePass::new()),
            Box::new(IdentifierRenamePass::new()),
        ];
        if config.fold_arithmetic {
            passes.push(Box::new(ArithmeticFoldingPass::new(
                config.max_fold_iterations,
            )));
        }
        passes.push(Box::new(BeautifyPass::new(config.indent_width)));
        Self { passes }
    }

    /// Names of the passes in execution order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn run(&mut self, source: &str) -> Result<String> {
        self.run_with_report(source).map(|(text, _)| text)
    }

    pub fn run_with_report(&mut self, source: &str) -> Result<(String, PipelineReport)> {
        let mut text = source.to_string();
        let mut report = PipelineReport::default();

        for pass in &mut self.passes {
            let name = pass.name();
            let _span = info_span!("pass", name).entered();
            let next = pass.run(&text)?;
            let changed = next != text;
            debug!(changed, bytes = next.len(), "pass finished");
            report.passes.push(PassOutcome { name, changed });
            text = next;
        }

        Ok((text, report))
    }
}

/// Run the default pipeline over `source`
pub fn deobfuscate(source: &str) -> Result<String> {
    Pipeline::default().run(source)
}
