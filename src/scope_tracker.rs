//! Label/goto/initialization-order validation over a function body.
//!
//! Walks a function's statement list once, tracking three things as it
//! goes: every label's uniqueness, every `goto`'s target resolves to a
//! label in scope, and no `goto` or label jumps into the middle of a
//! block past a `let` that the jump's destination would then observe as
//! uninitialized. This mirrors a single forward data-flow pass: by the
//! time we reach a `goto`, we know exactly which locals are live.

use std::collections::HashMap;

use crate::cst::Stmt;
use crate::diagnostics::{Diagnostics, Error};
use crate::source::SourceRef;
use crate::token::TokenStream;

#[derive(Clone, Debug)]
struct LabelInfo {
    src: SourceRef,
    /// Names bound by `let` before this label in its enclosing block, with
    /// the `let`'s own source location so a skipped one can be pointed at.
    live_locals: Vec<(String, SourceRef)>,
}

pub struct ScopeTracker {
    labels: HashMap<String, LabelInfo>,
    gotos: Vec<(String, SourceRef, Vec<(String, SourceRef)>)>,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self { labels: HashMap::new(), gotos: Vec::new() }
    }

    /// Single entry point: walks `body` collecting labels and gotos, then
    /// validates every goto against the labels seen, emitting diagnostics
    /// into `diags`. Returns `true` if no errors were found.
    pub fn check(body: &[Stmt], tokens: &TokenStream, diags: &mut Diagnostics) -> bool {
        let mut tracker = Self::new();
        tracker.walk(body, &mut Vec::new(), tokens, diags);
        tracker.validate(tokens, diags)
    }

    fn walk(&mut self, stmts: &[Stmt], live: &mut Vec<(String, SourceRef)>, tokens: &TokenStream, diags: &mut Diagnostics) {
        for stmt in stmts {
            match stmt {
                Stmt::Let { name, src, .. } => {
                    live.push((name.to_string(), *src));
                }
                Stmt::Label { name, src } => {
                    if let Some(existing) = self.labels.get(*name) {
                        diags.add(
                            Error::new(format!("label '{name}' is already defined"))
                                .with_message(*src, "redefined here", tokens)
                                .with_message(existing.src, "first defined here", tokens),
                        );
                    } else {
                        self.labels.insert(name.to_string(), LabelInfo { src: *src, live_locals: live.clone() });
                    }
                }
                Stmt::Goto { label, src } => {
                    self.gotos.push((label.to_string(), *src, live.clone()));
                }
                Stmt::If { then_branch, else_branch, .. } => {
                    self.walk(then_branch, &mut live.clone(), tokens, diags);
                    if let Some(else_branch) = else_branch {
                        self.walk(else_branch, &mut live.clone(), tokens, diags);
                    }
                }
                Stmt::While { body, .. } => {
                    self.walk(body, &mut live.clone(), tokens, diags);
                }
                Stmt::Block { stmts, .. } => {
                    self.walk(stmts, &mut live.clone(), tokens, diags);
                }
                _ => {}
            }
        }
    }

    fn validate(&self, tokens: &TokenStream, diags: &mut Diagnostics) -> bool {
        let had_errors = diags.has_errors();
        for (label, src, live_at_goto) in &self.gotos {
            match self.labels.get(label) {
                None => {
                    diags.add_simple(*src, format!("undefined label '{label}'"), "goto has no matching label", tokens);
                }
                Some(info) => {
                    // A jump skips initialization if the label's scope
                    // expects locals live that weren't live at the goto.
                    let live_names: Vec<&str> = live_at_goto.iter().map(|(n, _)| n.as_str()).collect();
                    for (name, decl_src) in &info.live_locals {
                        if !live_names.contains(&name.as_str()) {
                            diags.add(
                                Error::new(format!("goto skips initialization of '{name}'"))
                                    .with_message(*src, "jump happens here", tokens)
                                    .with_message(info.src, "label is here", tokens)
                                    .with_message(*decl_src, format!("'{name}' is declared here"), tokens),
                            );
                            break;
                        }
                    }
                }
            }
        }
        !had_errors && !diags.has_errors()
    }
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}
