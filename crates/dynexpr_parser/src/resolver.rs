//! Overload resolution.
//!
//! A candidate is applicable when its arity matches, it has no `out`
//! parameters, and every argument promotes to the parameter type. Among
//! the applicable candidates the resolver keeps those better than every
//! other; exactly one survivor is a match, and none at all makes the call
//! ambiguous.

use crate::promote::LiteralRegistry;
use dynexpr_ast::ExprRef;
use dynexpr_types::conversion::compare_conversions;
use dynexpr_types::MethodInfo;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Resolution {
    NotFound,
    Found(Arc<MethodInfo>),
    Ambiguous,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

struct Candidate<'m> {
    method: &'m Arc<MethodInfo>,
    args: Vec<ExprRef>,
}

fn applicable<'m>(lits: &LiteralRegistry, method: &'m Arc<MethodInfo>, args: &[ExprRef]) -> Option<Candidate<'m>> {
    if method.params.len() != args.len() {
        return None;
    }
    let promoted = method
        .params
        .iter()
        .zip(args)
        .map(|(p, a)| if p.is_out { None } else { lits.promote(a, &p.ty, false) })
        .collect::<Option<Vec<_>>>()?;
    Some(Candidate { method, args: promoted })
}

/// Whether `m1` beats `m2` for arguments of the original types: no worse at
/// any position and strictly better at one.
fn is_better_than(args: &[ExprRef], m1: &MethodInfo, m2: &MethodInfo) -> bool {
    let mut better = false;
    for ((a, p1), p2) in args.iter().zip(&m1.params).zip(&m2.params) {
        match compare_conversions(&a.ty, &p1.ty, &p2.ty) {
            Ordering::Less => return false,
            Ordering::Greater => better = true,
            Ordering::Equal => {}
        }
    }
    better
}

/// Pick the best of `methods` for `args`. On a unique match `args` is
/// replaced by its promoted form.
pub fn find_best_method(lits: &LiteralRegistry, methods: &[Arc<MethodInfo>], args: &mut Vec<ExprRef>) -> Resolution {
    let mut candidates: Vec<Candidate<'_>> = methods.iter().filter_map(|m| applicable(lits, m, args)).collect();
    if candidates.is_empty() {
        return Resolution::NotFound;
    }
    if candidates.len() > 1 {
        let survivors: Vec<bool> = candidates
            .iter()
            .enumerate()
            .map(|(i, m)| {
                candidates
                    .iter()
                    .enumerate()
                    .all(|(j, n)| i == j || is_better_than(args, m.method, n.method))
            })
            .collect();
        let mut keep = survivors.into_iter();
        candidates.retain(|_| keep.next().unwrap_or(false));
    }
    // Applicable candidates with no single best one are ambiguous.
    if candidates.len() != 1 {
        return Resolution::Ambiguous;
    }
    let best = candidates.swap_remove(0);
    *args = best.args;
    Resolution::Found(best.method.clone())
}

/// Resolve against method layers in order, stopping at the first layer
/// with any surviving candidate. Returns that layer's index with the
/// result; a `NotFound` result comes with the layer count.
pub fn find_layered<'m, I>(lits: &LiteralRegistry, layers: I, args: &mut Vec<ExprRef>) -> (usize, Resolution)
where
    I: IntoIterator<Item = &'m [Arc<MethodInfo>]>,
{
    let mut index = 0;
    for layer in layers {
        match find_best_method(lits, layer, args) {
            Resolution::NotFound => index += 1,
            found => return (index, found),
        }
    }
    (index, Resolution::NotFound)
}
