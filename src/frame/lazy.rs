// File: src/frame/lazy.rs
//
// Deferred column creation over a ColumnFrame. Building a plan costs nothing
// beyond pushing the expressions; all work happens in collect().

use super::columns::{ColumnFrame, Expr};
use crate::errors::Result;

#[derive(Debug, Clone)]
pub struct LazyFrame {
    source: ColumnFrame,
    /// One entry per with_columns call, applied in order
    pending: Vec<Vec<Expr>>,
}

impl LazyFrame {
    pub fn new(source: ColumnFrame) -> Self {
        Self { source, pending: Vec::new() }
    }

    pub fn with_columns(mut self, exprs: Vec<Expr>) -> Self {
        self.pending.push(exprs);
        self
    }

    pub fn collect(self) -> Result<ColumnFrame> {
        let mut frame = self.source;
        for exprs in &self.pending {
            frame = frame.with_columns(exprs)?;
        }
        Ok(frame)
    }
}
