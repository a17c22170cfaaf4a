use inkwell::{
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum},
    values::{BasicMetadataValueEnum, BasicValueEnum, IntValue, PointerValue, StructValue},
    AddressSpace, FloatPredicate, IntPredicate,
};

use crate::{
    ast::{
        ast::{Expr, Visitor},
        expressions::{ArrayLiteralExpr, BinaryExpr, CallExpr, CastExpr, IndexExpr, MemberExpr, UnaryExpr},
        types::Type,
    },
    lexer::tokens::TokenKind,
};

use super::compiler::{CodegenError, Compiler, GenResult};

/// Index of the first field buffer in a realigned array struct.
const REALIGNED_FIELDS: u32 = 2;

fn length_index(array: &Type) -> u32 {
    if array.realigned {
        0
    } else {
        1
    }
}

/// Generates an expression that must produce a value.
pub fn gen_value<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    expression: &Expr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    expression.accept(compiler)?.ok_or(CodegenError::VoidValue)
}

/// Generates an analyzed condition, which is always `bool`.
pub fn gen_condition<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    expression: &Expr,
) -> Result<IntValue<'ctx>, CodegenError> {
    Ok(gen_value(compiler, expression)?.into_int_value())
}

/// Generates the address an lvalue names.
///
/// Other expressions are spilled to a fresh stack slot so member access
/// works on call results too.
pub fn gen_address<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    expression: &Expr,
) -> Result<PointerValue<'ctx>, CodegenError> {
    match expression {
        Expr::Variable(node) => Ok(compiler.lookup(&node.identifier)?.pointer),
        Expr::Index(node) => gen_index_address(compiler, node),
        Expr::Member(node) => gen_member_address(compiler, node),
        Expr::Unary(node) if node.operator == TokenKind::Star => {
            Ok(gen_value(compiler, &node.operand)?.into_pointer_value())
        }
        _ => {
            let value = gen_value(compiler, expression)?;
            let slot = compiler.create_entry_alloca(value.get_type(), "tmp")?;
            compiler.builder.build_store(slot, value)?;
            Ok(slot)
        }
    }
}

pub fn gen_index_address<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &IndexExpr,
) -> Result<PointerValue<'ctx>, CodegenError> {
    let array = gen_value(compiler, &node.target)?.into_struct_value();
    let data = compiler
        .builder
        .build_extract_value(array, 0, "data")?
        .into_pointer_value();
    let index = gen_value(compiler, &node.index)?.into_int_value();
    let element = compiler.convert_type(&node.ty)?;

    element_address(compiler, element, data, index)
}

fn element_address<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    element: BasicTypeEnum<'ctx>,
    buffer: PointerValue<'ctx>,
    index: IntValue<'ctx>,
) -> Result<PointerValue<'ctx>, CodegenError> {
    // Indices are not bounds checked
    let address = unsafe {
        compiler
            .builder
            .build_in_bounds_gep(element, buffer, &[index], "element")?
    };
    Ok(address)
}

pub fn gen_member_address<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &MemberExpr,
) -> Result<PointerValue<'ctx>, CodegenError> {
    let symtable = compiler.symtable;
    let unknown_member =
        || CodegenError::UnknownType(format!("{}.{}", node.target.get_type(), node.member));

    if let Expr::Index(index) = node.target.as_ref() {
        let array_type = index.target.get_type();
        if array_type.realigned {
            let element = array_type.element_type().ok_or_else(unknown_member)?;
            let offset = symtable
                .member_offset(element, &node.member)
                .ok_or_else(unknown_member)? as u32;

            let array = gen_value(compiler, &index.target)?.into_struct_value();
            let buffer = compiler
                .builder
                .build_extract_value(array, REALIGNED_FIELDS + offset, &node.member)?
                .into_pointer_value();
            let position = gen_value(compiler, &index.index)?.into_int_value();
            let field = compiler.convert_type(&node.ty)?;

            return element_address(compiler, field, buffer, position);
        }
    }

    let target_type = node.target.get_type();
    let offset = symtable
        .member_offset(target_type, &node.member)
        .ok_or_else(unknown_member)? as u32;

    let pointer = gen_address(compiler, &node.target)?;
    let struct_type = compiler.convert_type(target_type)?;
    Ok(compiler
        .builder
        .build_struct_gep(struct_type, pointer, offset, &node.member)?)
}

pub fn gen_call<'ctx>(compiler: &mut Compiler<'_, 'ctx>, node: &CallExpr) -> GenResult<'ctx> {
    let symtable = compiler.symtable;
    let function = compiler
        .module
        .get_function(&node.identifier)
        .ok_or_else(|| CodegenError::UnknownFunction(node.identifier.clone()))?;
    let signature = symtable
        .function(&node.identifier)
        .ok_or_else(|| CodegenError::UnknownFunction(node.identifier.clone()))?;
    let fixed = signature.fixed_parameters();

    let mut arguments: Vec<BasicMetadataValueEnum<'ctx>> = vec![];
    for (position, argument) in node.arguments.iter().enumerate() {
        let value = gen_value(compiler, argument)?;

        let value = match fixed.get(position) {
            Some(parameter) if parameter.is_void_pointer() => {
                to_void_pointer(compiler, argument.get_type(), value)?
            }
            Some(_) => value,
            None => promote_variadic(compiler, value)?,
        };
        arguments.push(value.into());
    }

    let call = compiler
        .builder
        .build_call(function, &arguments, &node.identifier)?;
    Ok(call.try_as_basic_value().left())
}

/// Passes pointers and arrays where a `void*` is expected.
fn to_void_pointer<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    ty: &Type,
    value: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let pointer = if ty.is_array() && !ty.is_pointer() {
        compiler
            .builder
            .build_extract_value(value.into_struct_value(), 0, "data")?
            .into_pointer_value()
    } else {
        value.into_pointer_value()
    };

    let void_pointer = compiler.context.i8_type().ptr_type(AddressSpace::default());
    Ok(compiler
        .builder
        .build_pointer_cast(pointer, void_pointer, "erased")?
        .into())
}

/// C default argument promotions for arguments matched by `...`.
fn promote_variadic<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    value: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let builder = &compiler.builder;

    Ok(match value {
        BasicValueEnum::FloatValue(float) => builder
            .build_float_ext(float, compiler.context.f64_type(), "promoted")?
            .into(),
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => builder
            .build_int_z_extend(int, compiler.context.i32_type(), "promoted")?
            .into(),
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() < 32 => builder
            .build_int_s_extend(int, compiler.context.i32_type(), "promoted")?
            .into(),
        value => value,
    })
}

pub fn gen_binary<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &BinaryExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let operand_type = node.left.get_type();

    match node.operator {
        TokenKind::Assignment => {
            let pointer = gen_address(compiler, &node.left)?;
            let value = gen_value(compiler, &node.right)?;
            compiler.builder.build_store(pointer, value)?;
            Ok(value)
        }
        TokenKind::Push => gen_push(compiler, node),
        operator if operator.is_assignment() => {
            let arithmetic = operator.compound_operator().unwrap_or(operator);
            let pointer = gen_address(compiler, &node.left)?;
            let ty = compiler.convert_type(operand_type)?;
            let current = compiler.builder.build_load(ty, pointer, "current")?;
            let right = gen_value(compiler, &node.right)?;

            let value = gen_arithmetic(compiler, arithmetic, operand_type, current, right)?;
            compiler.builder.build_store(pointer, value)?;
            Ok(value)
        }
        operator if operator.is_comparison() => {
            let left = gen_value(compiler, &node.left)?;
            let right = gen_value(compiler, &node.right)?;
            gen_comparison(compiler, operator, operand_type, left, right)
        }
        operator => {
            let left = gen_value(compiler, &node.left)?;
            let right = gen_value(compiler, &node.right)?;
            gen_arithmetic(compiler, operator, operand_type, left, right)
        }
    }
}

fn unsupported(operator: TokenKind, ty: &Type) -> CodegenError {
    CodegenError::UnsupportedOperator {
        operator: operator.to_string(),
        type_: ty.to_string(),
    }
}

fn gen_arithmetic<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    operator: TokenKind,
    ty: &Type,
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let builder = &compiler.builder;

    if ty.is_scalar("float") {
        let (left, right) = (left.into_float_value(), right.into_float_value());
        let value = match operator {
            TokenKind::Plus => builder.build_float_add(left, right, "add")?,
            TokenKind::Dash => builder.build_float_sub(left, right, "sub")?,
            TokenKind::Star => builder.build_float_mul(left, right, "mul")?,
            TokenKind::Slash => builder.build_float_div(left, right, "div")?,
            TokenKind::Percent => builder.build_float_rem(left, right, "rem")?,
            _ => return Err(unsupported(operator, ty)),
        };
        return Ok(value.into());
    }

    if !ty.is_arithmetic() {
        return Err(unsupported(operator, ty));
    }

    let (left, right) = (left.into_int_value(), right.into_int_value());
    let value = match operator {
        TokenKind::Plus => builder.build_int_add(left, right, "add")?,
        TokenKind::Dash => builder.build_int_sub(left, right, "sub")?,
        TokenKind::Star => builder.build_int_mul(left, right, "mul")?,
        TokenKind::Slash => builder.build_int_signed_div(left, right, "div")?,
        TokenKind::Percent => builder.build_int_signed_rem(left, right, "rem")?,
        TokenKind::Ampersand => builder.build_and(left, right, "and")?,
        TokenKind::Pipe => builder.build_or(left, right, "or")?,
        TokenKind::Caret => builder.build_xor(left, right, "xor")?,
        _ => return Err(unsupported(operator, ty)),
    };
    Ok(value.into())
}

fn gen_comparison<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    operator: TokenKind,
    ty: &Type,
    left: BasicValueEnum<'ctx>,
    right: BasicValueEnum<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let builder = &compiler.builder;

    if ty.is_scalar("float") {
        let predicate = match operator {
            TokenKind::Equals => FloatPredicate::OEQ,
            TokenKind::NotEquals => FloatPredicate::ONE,
            TokenKind::Less => FloatPredicate::OLT,
            TokenKind::Greater => FloatPredicate::OGT,
            TokenKind::LessEquals => FloatPredicate::OLE,
            _ => FloatPredicate::OGE,
        };
        return Ok(builder
            .build_float_compare(
                predicate,
                left.into_float_value(),
                right.into_float_value(),
                "cmp",
            )?
            .into());
    }

    let predicate = match operator {
        TokenKind::Equals => IntPredicate::EQ,
        TokenKind::NotEquals => IntPredicate::NE,
        TokenKind::Less => IntPredicate::SLT,
        TokenKind::Greater => IntPredicate::SGT,
        TokenKind::LessEquals => IntPredicate::SLE,
        _ => IntPredicate::SGE,
    };

    let (left, right) = match (left, right) {
        (BasicValueEnum::IntValue(left), BasicValueEnum::IntValue(right)) => (left, right),
        (BasicValueEnum::PointerValue(left), BasicValueEnum::PointerValue(right)) => {
            let address = compiler.context.i64_type();
            (
                builder.build_ptr_to_int(left, address, "address")?,
                builder.build_ptr_to_int(right, address, "address")?,
            )
        }
        _ => return Err(unsupported(operator, ty)),
    };

    Ok(builder
        .build_int_compare(predicate, left, right, "cmp")?
        .into())
}

pub fn gen_unary<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &UnaryExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let operand_type = node.operand.get_type();

    match node.operator {
        TokenKind::Ampersand => Ok(gen_address(compiler, &node.operand)?.into()),
        TokenKind::Star => {
            let pointer = gen_value(compiler, &node.operand)?.into_pointer_value();
            let ty = compiler.convert_type(&node.ty)?;
            Ok(compiler.builder.build_load(ty, pointer, "deref")?)
        }
        TokenKind::Question => {
            let array = gen_value(compiler, &node.operand)?.into_struct_value();
            Ok(compiler
                .builder
                .build_extract_value(array, length_index(operand_type), "length")?)
        }
        TokenKind::Pop => gen_pop(compiler, node),
        operator => Err(unsupported(operator, operand_type)),
    }
}

pub fn gen_cast<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &CastExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let from = node.operand.get_type();
    let value = gen_value(compiler, &node.operand)?;
    if from == &node.target {
        return Ok(value);
    }

    let target = compiler.convert_type(&node.target)?;
    let value = if from.is_array() && !from.is_pointer() {
        compiler
            .builder
            .build_extract_value(value.into_struct_value(), 0, "data")?
    } else {
        value
    };

    let builder = &compiler.builder;
    let cast: BasicValueEnum<'ctx> = match (value, target) {
        (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(ty)) => builder
            .build_int_cast_sign_flag(int, ty, !from.is_scalar("bool"), "cast")?
            .into(),
        (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(ty)) => builder
            .build_signed_int_to_float(int, ty, "cast")?
            .into(),
        (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(ty)) => builder
            .build_float_to_signed_int(float, ty, "cast")?
            .into(),
        (BasicValueEnum::FloatValue(float), BasicTypeEnum::FloatType(ty)) => builder
            .build_float_cast(float, ty, "cast")?
            .into(),
        (BasicValueEnum::PointerValue(pointer), BasicTypeEnum::PointerType(ty)) => builder
            .build_pointer_cast(pointer, ty, "cast")?
            .into(),
        (BasicValueEnum::IntValue(int), BasicTypeEnum::PointerType(ty)) => builder
            .build_int_to_ptr(int, ty, "cast")?
            .into(),
        (BasicValueEnum::PointerValue(pointer), BasicTypeEnum::IntType(ty)) => builder
            .build_ptr_to_int(pointer, ty, "cast")?
            .into(),
        _ => {
            return Err(CodegenError::UnsupportedCast {
                from: from.to_string(),
                to: node.target.to_string(),
            })
        }
    };

    Ok(cast)
}

/// `[n]T` allocates `n` elements on the heap, `[]T` is an empty array.
pub fn gen_array_literal<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &ArrayLiteralExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let array_type = compiler.convert_type(&node.ty)?.into_struct_type();

    let Some(length) = &node.length else {
        return Ok(array_type.const_zero().into());
    };
    let length = gen_value(compiler, length)?.into_int_value();
    let element = node
        .ty
        .element_type()
        .ok_or_else(|| CodegenError::UnknownType(node.ty.to_string()))?;

    let mut array: StructValue<'ctx> = array_type.get_undef();
    let length_at = length_index(&node.ty);
    array = insert(compiler, array, length.into(), length_at)?;
    array = insert(compiler, array, length.into(), length_at + 1)?;

    if node.ty.realigned {
        let fields = compiler.field_types(element)?;
        for (offset, field) in fields.into_iter().enumerate() {
            let buffer = allocate(compiler, field, length, None)?;
            array = insert(compiler, array, buffer.into(), REALIGNED_FIELDS + offset as u32)?;
        }
    } else {
        let element = compiler.convert_type(element)?;
        let buffer = allocate(compiler, element, length, None)?;
        array = insert(compiler, array, buffer.into(), 0)?;
    }

    Ok(array.into())
}

fn insert<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    array: StructValue<'ctx>,
    value: BasicValueEnum<'ctx>,
    index: u32,
) -> Result<StructValue<'ctx>, CodegenError> {
    Ok(compiler
        .builder
        .build_insert_value(array, value, index, "")?
        .into_struct_value())
}

/// Heap buffer for `count` values of `ty`, through `malloc`, or through
/// `realloc` when growing `existing`.
fn allocate<'ctx>(
    compiler: &Compiler<'_, 'ctx>,
    ty: BasicTypeEnum<'ctx>,
    count: IntValue<'ctx>,
    existing: Option<PointerValue<'ctx>>,
) -> Result<PointerValue<'ctx>, CodegenError> {
    let builder = &compiler.builder;
    let size_type = compiler.context.i64_type();
    let byte_pointer = compiler.context.i8_type().ptr_type(AddressSpace::default());

    let element_size = ty
        .size_of()
        .ok_or_else(|| CodegenError::UnknownType(format!("{:?}", ty)))?;
    let count = builder.build_int_s_extend(count, size_type, "count")?;
    let bytes = builder.build_int_mul(count, element_size, "bytes")?;

    let call = match existing {
        Some(existing) => {
            let realloc = compiler.runtime_function(
                "realloc",
                byte_pointer.fn_type(
                    &[
                        BasicMetadataTypeEnum::from(byte_pointer),
                        BasicMetadataTypeEnum::from(size_type),
                    ],
                    false,
                ),
            );
            let existing = builder.build_pointer_cast(existing, byte_pointer, "raw")?;
            builder.build_call(realloc, &[existing.into(), bytes.into()], "buffer")?
        }
        None => {
            let malloc = compiler.runtime_function(
                "malloc",
                byte_pointer.fn_type(&[BasicMetadataTypeEnum::from(size_type)], false),
            );
            builder.build_call(malloc, &[bytes.into()], "buffer")?
        }
    };

    let raw = call
        .try_as_basic_value()
        .left()
        .ok_or(CodegenError::VoidValue)?
        .into_pointer_value();
    Ok(builder.build_pointer_cast(raw, ty.ptr_type(AddressSpace::default()), "buffer")?)
}

/// `array <- value` grows every buffer by one slot and stores `value` at the
/// old length.
fn gen_push<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &BinaryExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let array_type = node.left.get_type();
    let element = array_type
        .element_type()
        .ok_or_else(|| unsupported(node.operator, array_type))?;

    let pointer = gen_address(compiler, &node.left)?;
    let struct_type = compiler.convert_type(array_type)?;
    let value = gen_value(compiler, &node.right)?;
    let mut array = compiler
        .builder
        .build_load(struct_type, pointer, "array")?
        .into_struct_value();

    let length_at = length_index(array_type);
    let length = compiler
        .builder
        .build_extract_value(array, length_at, "length")?
        .into_int_value();
    let grown_length = compiler.builder.build_int_add(
        length,
        compiler.context.i32_type().const_int(1, false),
        "grown",
    )?;

    let buffers: Vec<(u32, BasicTypeEnum<'ctx>, Option<u32>)> = if array_type.realigned {
        compiler
            .field_types(element)?
            .into_iter()
            .enumerate()
            .map(|(offset, field)| (REALIGNED_FIELDS + offset as u32, field, Some(offset as u32)))
            .collect()
    } else {
        vec![(0, compiler.convert_type(element)?, None)]
    };

    for (index, ty, field) in buffers {
        let buffer = compiler
            .builder
            .build_extract_value(array, index, "buffer")?
            .into_pointer_value();
        let grown = allocate(compiler, ty, grown_length, Some(buffer))?;

        let stored = match field {
            Some(field) => compiler.builder.build_extract_value(
                value.into_struct_value(),
                field,
                "field",
            )?,
            None => value,
        };
        let slot = element_address(compiler, ty, grown, length)?;
        compiler.builder.build_store(slot, stored)?;

        array = insert(compiler, array, grown.into(), index)?;
    }

    array = insert(compiler, array, grown_length.into(), length_at)?;
    array = insert(compiler, array, grown_length.into(), length_at + 1)?;
    compiler.builder.build_store(pointer, array)?;

    Ok(array.into())
}

/// `array->` shrinks the array by one and yields the removed element. The
/// buffers keep their capacity.
fn gen_pop<'ctx>(
    compiler: &mut Compiler<'_, 'ctx>,
    node: &UnaryExpr,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let array_type = node.operand.get_type();
    let element = array_type
        .element_type()
        .ok_or_else(|| unsupported(node.operator, array_type))?;

    let pointer = gen_address(compiler, &node.operand)?;
    let struct_type = compiler.convert_type(array_type)?;
    let array = compiler
        .builder
        .build_load(struct_type, pointer, "array")?
        .into_struct_value();

    let length_at = length_index(array_type);
    let length = compiler
        .builder
        .build_extract_value(array, length_at, "length")?
        .into_int_value();
    let last = compiler.builder.build_int_sub(
        length,
        compiler.context.i32_type().const_int(1, false),
        "last",
    )?;

    let shrunk = insert(compiler, array, last.into(), length_at)?;
    compiler.builder.build_store(pointer, shrunk)?;

    if !array_type.realigned {
        let ty = compiler.convert_type(element)?;
        let buffer = compiler
            .builder
            .build_extract_value(array, 0, "buffer")?
            .into_pointer_value();
        let slot = element_address(compiler, ty, buffer, last)?;
        return Ok(compiler.builder.build_load(ty, slot, "popped")?);
    }

    let element_type = compiler.convert_type(element)?.into_struct_type();
    let mut popped = element_type.get_undef();
    let fields = compiler.field_types(element)?;
    for (offset, ty) in fields.into_iter().enumerate() {
        let buffer = compiler
            .builder
            .build_extract_value(array, REALIGNED_FIELDS + offset as u32, "buffer")?
            .into_pointer_value();
        let slot = element_address(compiler, ty, buffer, last)?;
        let value = compiler.builder.build_load(ty, slot, "field")?;
        popped = insert(compiler, popped, value, offset as u32)?;
    }

    Ok(popped.into())
}
