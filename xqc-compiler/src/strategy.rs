use xqc_ast::{
    BindingKind, BindingTable, BuiltinFunction, Cardinality, Dependencies, EvaluationMode, Expr, ExprKind,
    FunctionRef, Methods, Slot, VarRef,
};

/// Choose how each bound value is evaluated at run time. Runs last, on
/// the finished tree.
pub fn assign_modes(expr: Expr, bindings: &BindingTable) -> Expr {
    let expr = match expr.map_children(&mut |child| {
        Ok::<_, std::convert::Infallible>(assign_modes(child, bindings))
    }) {
        Ok(expr) => expr,
        Err(never) => match never {},
    };
    match expr.kind {
        ExprKind::Let {
            slot,
            mut value,
            action,
        } => {
            value.mode = choose(slot, &value, &action, bindings);
            tracing::trace!(slot = slot.0, mode = ?value.mode, %value, "evaluation mode");
            Expr {
                kind: ExprKind::Let {
                    slot,
                    value,
                    action,
                },
                ..expr
            }
        }
        kind => Expr { kind, ..expr },
    }
}

fn choose(slot: Slot, value: &Expr, action: &Expr, bindings: &BindingTable) -> EvaluationMode {
    let captured = || value.free_slots().into_iter().collect::<Box<[Slot]>>();
    // a hoisted value may sit in a branch never taken, or fail
    if bindings.get(slot).kind == BindingKind::Hoisted {
        return EvaluationMode::MemoClosure(captured());
    }
    if value.info.cardinality == Cardinality::Empty {
        return EvaluationMode::ReturnEmpty;
    }
    match &value.kind {
        ExprKind::Literal(_) => return EvaluationMode::AlreadyValue,
        ExprKind::VarRef(_) => return EvaluationMode::EvaluateVariable,
        _ => {}
    }
    // closures don't capture the focus
    if value.info.dependencies.intersects(
        Dependencies::FOCUS | Dependencies::CURRENT_GROUP | Dependencies::MATCHED_GROUP,
    ) {
        return eager(value);
    }
    if value.info.cardinality.at_most_one() {
        return eager(value);
    }
    if is_tail_of_variable(value) {
        return EvaluationMode::LazyTail;
    }
    if is_append_to_variable(value) {
        return EvaluationMode::SharedAppend;
    }
    // every evaluation has to create the same nodes
    if value.info.creates_nodes {
        return eager(value);
    }
    if action.slot_uses(slot) > 1 || is_random_access(slot, action) {
        EvaluationMode::MemoClosure(captured())
    } else {
        EvaluationMode::OneShotClosure(captured())
    }
}

fn eager(value: &Expr) -> EvaluationMode {
    let methods = value.methods();
    if methods == Methods::PROCESS {
        EvaluationMode::PushProduction
    } else if value.info.cardinality.at_most_one() {
        EvaluationMode::SingleItem
    } else {
        EvaluationMode::IterateAndMaterialize
    }
}

fn is_variable(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::VarRef(_))
}

/// `$v[position() >= n]` or `tail($v)`.
fn is_tail_of_variable(value: &Expr) -> bool {
    match &value.kind {
        ExprKind::Slice {
            base, max: None, ..
        } => is_variable(base),
        ExprKind::FunctionCall {
            function: FunctionRef::Builtin(BuiltinFunction::Tail),
            args,
        } => matches!(args.as_slice(), [arg] if is_variable(arg)),
        _ => false,
    }
}

/// `($v, something)`
fn is_append_to_variable(value: &Expr) -> bool {
    matches!(&value.kind, ExprKind::Block(items) if items.len() == 2 && is_variable(&items[0]))
}

/// Does the body pick items out of the variable by index? A one-shot
/// closure can only be walked once from the start.
fn is_random_access(slot: Slot, action: &Expr) -> bool {
    let mut found = false;
    action.walk(&mut |e| match &e.kind {
        ExprKind::ItemAt { base, .. }
        | ExprKind::LastItem(base)
        | ExprKind::Slice { base, .. }
        | ExprKind::IndexedFilter { base, .. } => {
            found |= matches!(base.kind, ExprKind::VarRef(VarRef::Range(s)) if s == slot);
        }
        _ => {}
    });
    found
}
