//! Static extraction of step-definition registrations from Rust source.
//!
//! The extractor parses a definition file with `syn` and walks every call
//! and method-call expression without executing anything. A call registers a
//! step definition when the callee's simple name — the final path segment of
//! a free call, or the method name of a method call — appears in the
//! registration table and the first argument is a static pattern literal.
//!
//! Recognised first-argument forms:
//!
//! - a plain or raw string literal registers an expression pattern;
//! - a `format!(...)` invocation is rejected outright: an interpolated
//!   pattern is not static, so the whole call is ignored;
//! - a `Regex::new("...")` call with a literal argument registers a regex
//!   pattern; a leading inline flag group such as `(?i)` is split off into
//!   the definition's flag field;
//! - any other form (identifier, computed expression) yields nothing.

use std::path::{Path, PathBuf};

use syn::spanned::Spanned;
use syn::visit::Visit;

use stepscope_patterns::{KeywordFilter, StepKeyword};

use crate::model::{PatternKind, SourceSpan, StepDefinition};

/// Registration functions recognised by the extractor, matched
/// case-insensitively against the callee's simple name.
const REGISTRATION_FUNCTIONS: [(&str, KeywordFilter); 6] = [
    ("given", KeywordFilter::Keyword(StepKeyword::Given)),
    ("when", KeywordFilter::Keyword(StepKeyword::When)),
    ("then", KeywordFilter::Keyword(StepKeyword::Then)),
    ("step", KeywordFilter::Any),
    ("define_step", KeywordFilter::Any),
    ("definestep", KeywordFilter::Any),
];

/// Extract every step-definition registration from a source file, in source
/// order.
///
/// A file that fails to parse as Rust is logged and yields an empty list:
/// one malformed file must never abort extraction for the rest of a batch.
#[must_use]
pub fn extract_definitions(path: &Path, source: &str) -> Vec<StepDefinition> {
    let file = match syn::parse_file(source) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to parse definition file");
            return Vec::new();
        }
    };

    let mut collector = CallCollector {
        path: path.to_path_buf(),
        definitions: Vec::new(),
    };
    collector.visit_file(&file);
    collector.definitions
}

struct CallCollector {
    path: PathBuf,
    definitions: Vec<StepDefinition>,
}

impl<'ast> Visit<'ast> for CallCollector {
    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        if let Some(name) = path_simple_name(&node.func) {
            self.record(&name, node.args.first(), span_of(node));
        }
        syn::visit::visit_expr_call(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        let name = node.method.to_string();
        self.record(&name, node.args.first(), span_of(node));
        syn::visit::visit_expr_method_call(self, node);
    }
}

impl CallCollector {
    fn record(&mut self, function_name: &str, first_arg: Option<&syn::Expr>, span: SourceSpan) {
        let Some(keyword) = registration_filter(function_name) else {
            return;
        };
        let Some(arg) = first_arg else {
            return;
        };
        let Some(pattern) = extract_pattern(arg) else {
            return;
        };

        self.definitions.push(StepDefinition {
            pattern: pattern.pattern,
            kind: pattern.kind,
            regex_flags: pattern.flags,
            keyword,
            path: self.path.clone(),
            span,
            function_name: function_name.to_owned(),
        });
    }
}

/// Look up a callee name in the registration table.
fn registration_filter(name: &str) -> Option<KeywordFilter> {
    REGISTRATION_FUNCTIONS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, filter)| *filter)
}

/// Resolve the simple name of a free call's callee: the final segment of a
/// plain or qualified path.
fn path_simple_name(callee: &syn::Expr) -> Option<String> {
    let syn::Expr::Path(expr_path) = callee else {
        return None;
    };
    expr_path
        .path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
}

struct ExtractedPattern {
    pattern: String,
    kind: PatternKind,
    flags: Option<String>,
}

fn extract_pattern(arg: &syn::Expr) -> Option<ExtractedPattern> {
    match arg {
        syn::Expr::Lit(expr_lit) => {
            let syn::Lit::Str(lit) = &expr_lit.lit else {
                return None;
            };
            Some(ExtractedPattern {
                pattern: lit.value(),
                kind: PatternKind::Expression,
                flags: None,
            })
        }
        // An interpolated pattern is not static; ignore the call entirely.
        syn::Expr::Macro(expr_macro) if macro_is_format(&expr_macro.mac) => None,
        syn::Expr::Call(call) if is_regex_constructor(&call.func) => {
            let first = call.args.first()?;
            let syn::Expr::Lit(expr_lit) = first else {
                return None;
            };
            let syn::Lit::Str(lit) = &expr_lit.lit else {
                return None;
            };
            let (flags, body) = split_inline_flags(&lit.value());
            Some(ExtractedPattern {
                pattern: body,
                kind: PatternKind::Regex,
                flags,
            })
        }
        _ => None,
    }
}

fn macro_is_format(mac: &syn::Macro) -> bool {
    mac.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "format")
}

/// Whether the callee is a `Regex::new` path, possibly crate-qualified.
fn is_regex_constructor(callee: &syn::Expr) -> bool {
    let syn::Expr::Path(expr_path) = callee else {
        return false;
    };
    let mut segments = expr_path.path.segments.iter().rev();
    let Some(last) = segments.next() else {
        return false;
    };
    let Some(second_last) = segments.next() else {
        return false;
    };
    last.ident == "new" && second_last.ident == "Regex"
}

/// Split a leading inline flag group such as `(?im)` off a regex body.
///
/// Returns `(None, body)` unchanged when no valid flag group leads the
/// pattern; an empty flag set is not an error, just absent. Groups
/// containing `:` or `-` are scoped constructs, not global flags, and are
/// left in place.
fn split_inline_flags(raw: &str) -> (Option<String>, String) {
    let Some(rest) = raw.strip_prefix("(?") else {
        return (None, raw.to_owned());
    };
    let Some(end) = rest.find(')') else {
        return (None, raw.to_owned());
    };
    let (flags, tail) = rest.split_at(end);
    let body = tail.strip_prefix(')').unwrap_or(tail);
    if flags.is_empty() || !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'u' | 'U')) {
        return (None, raw.to_owned());
    }
    (Some(flags.to_owned()), body.to_owned())
}

/// Span of the whole call expression, 0-based, for navigation.
#[expect(
    clippy::cast_possible_truncation,
    reason = "line/column numbers from syn will not exceed u32::MAX in practice"
)]
fn span_of<T: Spanned>(node: &T) -> SourceSpan {
    let span = node.span();
    let start = span.start();
    let end = span.end();
    SourceSpan {
        start_line: start.line.saturating_sub(1) as u32,
        start_column: start.column as u32,
        end_line: end.line.saturating_sub(1) as u32,
        end_column: end.column as u32,
    }
}
