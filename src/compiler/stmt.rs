use inkwell::values::BasicValue;

use crate::ast::{
    ast::Visitor,
    statements::{BranchStmt, FnDeclStmt, LoopStmt, ReturnStmt, Stmt, VarDeclStmt},
};

use super::{
    compiler::{CodegenError, Compiler, GenResult, Variable},
    expr::{gen_condition, gen_value},
};

/// Generates a function body, spilling every parameter to a stack slot.
pub fn gen_function<'ctx>(compiler: &mut Compiler<'_, 'ctx>, node: &FnDeclStmt) -> GenResult<'ctx> {
    let signature = &node.signature;
    let function = compiler
        .module
        .get_function(&signature.name)
        .ok_or_else(|| CodegenError::UnknownFunction(signature.name.clone()))?;

    compiler.function = Some(function);
    let entry = compiler.context.append_basic_block(function, "entry");
    compiler.builder.position_at_end(entry);

    compiler.scopes.clear();
    compiler.open_scope();

    for ((parameter, ty), name) in function
        .get_param_iter()
        .zip(signature.parameters.iter())
        .zip(signature.parameter_names.iter())
    {
        parameter.set_name(name);
        let slot = compiler.create_entry_alloca(parameter.get_type(), name)?;
        compiler.builder.build_store(slot, parameter)?;
        compiler.declare_variable(
            name,
            Variable {
                pointer: slot,
                ty: ty.clone(),
            },
        );
    }

    gen_block(compiler, &node.body)?;

    // Branches that all return leave an unreachable join block behind
    if !compiler.is_terminated() {
        if signature.return_type.is_void() {
            compiler.builder.build_return(None)?;
        } else {
            compiler.builder.build_unreachable()?;
        }
    }

    compiler.close_scope();
    compiler.function = None;
    Ok(None)
}

/// Generates statements until one of them terminates the current block.
pub fn gen_block<'ctx>(compiler: &mut Compiler<'_, 'ctx>, body: &[Stmt]) -> Result<(), CodegenError> {
    for stmt in body {
        if compiler.is_terminated() {
            break;
        }
        stmt.accept(compiler)?;
    }

    Ok(())
}

fn gen_scoped_block<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    body: &[Stmt],
) -> Result<(), CodegenError> {
    compiler.open_scope();
    let result = gen_block(compiler, body);
    compiler.close_scope();
    result
}

pub fn gen_var_decl<'ctx>(compiler: &mut Compiler<'_, 'ctx>, node: &VarDeclStmt) -> GenResult<'ctx> {
    let ty = compiler.convert_type(&node.ty)?;

    let value = match &node.value {
        Some(value) => gen_value(compiler, value)?,
        None => ty.const_zero(),
    };

    let slot = compiler.create_entry_alloca(ty, &node.identifier)?;
    compiler.builder.build_store(slot, value)?;
    compiler.declare_variable(
        &node.identifier,
        Variable {
            pointer: slot,
            ty: node.ty.clone(),
        },
    );

    Ok(None)
}

pub fn gen_return<'ctx>(compiler: &mut Compiler<'_, 'ctx>, node: &ReturnStmt) -> GenResult<'ctx> {
    match &node.value {
        Some(value) => {
            let value = gen_value(compiler, value)?;
            compiler
                .builder
                .build_return(Some(&value as &dyn BasicValue))?;
        }
        None => {
            compiler.builder.build_return(None)?;
        }
    }

    Ok(None)
}

pub fn gen_branch<'ctx>(compiler: &mut Compiler<'_, 'ctx>, node: &BranchStmt) -> GenResult<'ctx> {
    let condition = gen_condition(compiler, &node.condition)?;

    let then_block = compiler.create_basic_block("then")?;
    let else_block = match node.else_body {
        Some(_) => Some(compiler.create_basic_block("else")?),
        None => None,
    };
    let end_block = compiler.create_basic_block("end")?;

    compiler.builder.build_conditional_branch(
        condition,
        then_block,
        else_block.unwrap_or(end_block),
    )?;

    compiler.builder.position_at_end(then_block);
    gen_scoped_block(compiler, &node.body)?;
    if !compiler.is_terminated() {
        compiler.builder.build_unconditional_branch(end_block)?;
    }

    if let (Some(else_block), Some(else_body)) = (else_block, &node.else_body) {
        compiler.builder.position_at_end(else_block);
        gen_scoped_block(compiler, else_body)?;
        if !compiler.is_terminated() {
            compiler.builder.build_unconditional_branch(end_block)?;
        }
    }

    compiler.builder.position_at_end(end_block);
    Ok(None)
}

/// `while` and `for` share one shape: prefix, then a condition block that
/// guards the body, with the suffix run at the end of every iteration.
pub fn gen_loop<'ctx>(compiler: &mut Compiler<'_, 'ctx>, node: &LoopStmt) -> GenResult<'ctx> {
    compiler.open_scope();

    if let Some(prefix) = &node.prefix {
        prefix.accept(compiler)?;
    }

    let condition_block = compiler.create_basic_block("condition")?;
    let body_block = compiler.create_basic_block("loop")?;
    let end_block = compiler.create_basic_block("end")?;

    compiler
        .builder
        .build_unconditional_branch(condition_block)?;

    compiler.builder.position_at_end(condition_block);
    let condition = gen_condition(compiler, &node.condition)?;
    compiler
        .builder
        .build_conditional_branch(condition, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    gen_scoped_block(compiler, &node.body)?;
    if !compiler.is_terminated() {
        if let Some(suffix) = &node.suffix {
            suffix.accept(compiler)?;
        }
        compiler
            .builder
            .build_unconditional_branch(condition_block)?;
    }

    compiler.builder.position_at_end(end_block);
    compiler.close_scope();
    Ok(None)
}
