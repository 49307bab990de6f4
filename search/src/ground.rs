//! Ground-entity representations shared by the lifted generator, the
//! match tree and the grounded generator: a ground
//! action/axiom's precondition is expressed purely over
//! [`GroundAtomIndex`]/[`GroundFunctionIndex`] so the match tree never
//! needs to re-substitute a binding to index or query it.
//!
//! Static literals are not represented here at all: by the time a
//! binding reaches [`crate::binding_generator::BindingGenerator`]'s
//! output, every static literal of the owning condition already holds
//! (the static consistency graph build filters on them), so
//! grounding never re-checks them.

use mimir_collections::Idx;
use mimir_formalism::{
    ActionIndex, AxiomIndex, BinaryOp, Comparator, GroundAtomIndex, GroundFunctionIndex, GroundFunctionRepository, NumericConstraint, NumericEffectKind,
    NumericExpression, ObjectIndex, Term,
};
use smallvec::SmallVec;

/// A numeric expression with every [`FunctionIndex`] application
/// resolved to the dense [`GroundFunctionIndex`] that indexes a packed
/// state's numeric-value array.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum GroundNumericExpression {
    Constant(u64),
    Function(GroundFunctionIndex),
    Binary(BinaryOp, Box<GroundNumericExpression>, Box<GroundNumericExpression>),
}

impl GroundNumericExpression {
    /// Evaluates against a packed state's numeric-value array. A
    /// function index beyond the array's current length means no
    /// ground action referencing it has ever been used to extend the
    /// array, which is reported as the undefined-function-value case.
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, mimir_formalism::NumericError> {
        match self {
            GroundNumericExpression::Constant(bits) => Ok(f64::from_bits(*bits)),
            GroundNumericExpression::Function(idx) => values
                .get(idx.to_usize())
                .copied()
                .ok_or(mimir_formalism::NumericError::UndefinedFunctionValue),
            GroundNumericExpression::Binary(op, lhs, rhs) => {
                let l = lhs.evaluate(values)?;
                let r = rhs.evaluate(values)?;
                if matches!(op, BinaryOp::Div) && r == 0.0 {
                    return Err(mimir_formalism::NumericError::DivisionByZero);
                }
                Ok(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                })
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GroundNumericConstraint {
    pub comparator: Comparator,
    pub lhs: GroundNumericExpression,
    pub rhs: GroundNumericExpression,
}

impl GroundNumericConstraint {
    pub fn evaluate(&self, values: &[f64]) -> Result<bool, mimir_formalism::NumericError> {
        let l = self.lhs.evaluate(values)?;
        let r = self.rhs.evaluate(values)?;
        Ok(self.comparator.evaluate(l, r))
    }
}

fn object_args(terms: &[Term], binding: &[ObjectIndex]) -> SmallVec<[ObjectIndex; 4]> {
    terms
        .iter()
        .map(|t| match t {
            Term::Object(o) => *o,
            Term::Variable(v) => binding[v.parameter_index as usize],
        })
        .collect()
}

/// Substitutes `binding` into `expr`, resolving every function
/// application against the already-built [`GroundFunctionRepository`]
/// (search-time code never interns new ground functions — every one
/// that can hold a value is established once, from the problem's
/// initial numeric values, when the state repository is built; an
/// application with no matching entry resolves to the absent index,
/// which [`GroundNumericExpression::evaluate`] reports as undefined).
pub fn ground_numeric_expression(expr: &NumericExpression, binding: &[ObjectIndex], ground_functions: &GroundFunctionRepository) -> GroundNumericExpression {
    match expr {
        NumericExpression::Constant(bits) => GroundNumericExpression::Constant(*bits),
        NumericExpression::Function { function, terms } => {
            let objects = object_args(terms, binding);
            let idx = ground_functions.get_ref(*function, &objects).unwrap_or_else(GroundFunctionIndex::absent);
            GroundNumericExpression::Function(idx)
        }
        NumericExpression::Binary(op, lhs, rhs) => GroundNumericExpression::Binary(
            *op,
            Box::new(ground_numeric_expression(lhs, binding, ground_functions)),
            Box::new(ground_numeric_expression(rhs, binding, ground_functions)),
        ),
    }
}

pub fn ground_numeric_constraint(constraint: &NumericConstraint, binding: &[ObjectIndex], ground_functions: &GroundFunctionRepository) -> GroundNumericConstraint {
    GroundNumericConstraint {
        comparator: constraint.comparator,
        lhs: ground_numeric_expression(&constraint.lhs, binding, ground_functions),
        rhs: ground_numeric_expression(&constraint.rhs, binding, ground_functions),
    }
}

/// A ground condition expressed purely over fluent/derived atom
/// indices and ground numeric constraints — exactly what the match
/// tree indexes on and what the state repository tests a
/// conditional effect against.
#[derive(Clone, Default, Debug)]
pub struct GroundCondition {
    /// (atom, required polarity) pairs over the fluent bitset.
    pub fluent_literals: Vec<(GroundAtomIndex, bool)>,
    /// (atom, required polarity) pairs over the derived bitset.
    pub derived_literals: Vec<(GroundAtomIndex, bool)>,
    pub numeric_constraints: Vec<GroundNumericConstraint>,
}

impl GroundCondition {
    pub fn holds(&self, fluent_atoms: &fixedbitset::FixedBitSet, derived_atoms: &fixedbitset::FixedBitSet, numeric_values: &[f64]) -> Result<bool, mimir_formalism::NumericError> {
        for &(atom, polarity) in &self.fluent_literals {
            if fluent_atoms.contains(atom.to_usize()) != polarity {
                return Ok(false);
            }
        }
        for &(atom, polarity) in &self.derived_literals {
            if derived_atoms.contains(atom.to_usize()) != polarity {
                return Ok(false);
            }
        }
        for constraint in &self.numeric_constraints {
            if !constraint.evaluate(numeric_values)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Clone, Debug)]
pub struct GroundNumericEffect {
    pub kind: NumericEffectKind,
    pub function: GroundFunctionIndex,
    pub operand: GroundNumericExpression,
}

#[derive(Clone, Default, Debug)]
pub struct GroundConjunctiveEffect {
    pub add_effects: Vec<GroundAtomIndex>,
    pub delete_effects: Vec<GroundAtomIndex>,
    pub numeric_effects: Vec<GroundNumericEffect>,
}

#[derive(Clone, Debug)]
pub struct GroundConditionalEffect {
    pub condition: GroundCondition,
    pub effect: GroundConjunctiveEffect,
}

/// A fully materialised ground action: all conditional
/// effects retained, cost a ground numeric expression evaluated against
/// the parent state at successor-construction time.
#[derive(Clone, Debug)]
pub struct GroundAction {
    pub schema: ActionIndex,
    pub objects: SmallVec<[ObjectIndex; 4]>,
    pub precondition: GroundCondition,
    pub effects: Vec<GroundConditionalEffect>,
    pub cost: GroundNumericExpression,
}

/// A fully materialised ground axiom.
#[derive(Clone, Debug)]
pub struct GroundAxiom {
    pub axiom: AxiomIndex,
    pub objects: SmallVec<[ObjectIndex; 4]>,
    pub precondition: GroundCondition,
    pub head: GroundAtomIndex,
}

pub const UNIT_COST: GroundNumericExpression = GroundNumericExpression::Constant(0x3ff0000000000000u64); // 1.0_f64.to_bits()

/// Mixing effect families on the same function across a ground action's
/// conditional effects is forbidden and is checked
/// once at ground time rather than per successor: two conditional
/// effects can never both fire for the same transition if they'd
/// conflict at runtime only by coincidence, so the conservative check
/// considers every conditional effect regardless of which actually
/// trigger.
pub fn effect_family_conflict(action: &GroundAction) -> Option<GroundFunctionIndex> {
    let mut families: hashbrown::HashMap<GroundFunctionIndex, mimir_formalism::EffectFamily> = hashbrown::HashMap::new();
    for cond_effect in &action.effects {
        for eff in &cond_effect.effect.numeric_effects {
            if eff.function.is_absent() {
                continue;
            }
            let family = eff.kind.family();
            match families.get(&eff.function) {
                Some(&existing) if existing != family => return Some(eff.function),
                _ => {
                    families.insert(eff.function, family);
                }
            }
        }
    }
    None
}
