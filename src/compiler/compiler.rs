//! Main code generator structure.
//!
//! `Compiler` owns the LLVM module and builder for one program, translates
//! ghoul types to LLVM types and implements `Visitor` by dispatching to the
//! statement and expression generators.

use std::{collections::HashMap, path::Path};

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::{Builder, BuilderError},
    context::Context,
    module::{Linkage, Module},
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType},
    values::{BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace, OptimizationLevel,
};
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        ast::Visitor,
        expressions::{
            ArrayLiteralExpr, BinaryExpr, BoolExpr, CallExpr, CastExpr, FloatExpr, IndexExpr,
            IntExpr, MemberExpr, StringExpr, UnaryExpr, VariableExpr,
        },
        statements::{
            BranchStmt, ExternDeclStmt, FnDeclStmt, LinkStmt, LoopStmt, ReturnStmt,
            StructDeclStmt, Toplevel, VarDeclStmt,
        },
        types::{FunctionSignature, Type},
    },
    symtable::symtable::SymTable,
};

use super::{expr, stmt};

/// Failures while lowering an analyzed program.
///
/// The analyzer rejects ill-typed programs, so these only surface for
/// constructs the generator does not lower or for LLVM-level failures.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("LLVM builder failed: {0}")]
    Builder(#[from] BuilderError),
    #[error("Unknown type '{0}'")]
    UnknownType(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("Cannot lower '{operator}' for type '{type_}'")]
    UnsupportedOperator { operator: String, type_: String },
    #[error("Cannot lower cast from '{from}' into '{to}'")]
    UnsupportedCast { from: String, to: String },
    #[error("Expression of type 'void' used as a value")]
    VoidValue,
    #[error("Target setup failed: {0}")]
    Target(String),
    #[error("Generated module is invalid: {0}")]
    InvalidModule(String),
    #[error("Failed to write IR: {0}")]
    Write(String),
}

/// Result of visiting a node: the produced value, if any.
pub type GenResult<'ctx> = Result<Option<BasicValueEnum<'ctx>>, CodegenError>;

/// A local's stack slot and its ghoul type.
#[derive(Debug, Clone)]
pub struct Variable<'ctx> {
    pub pointer: PointerValue<'ctx>,
    pub ty: Type,
}

pub struct Compiler<'a, 'ctx> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,
    /// Layouts and signatures from analysis
    pub symtable: &'a SymTable,

    pub named_structs: HashMap<String, StructType<'ctx>>,
    /// Array structs keyed by element type spelling
    pub array_structs: HashMap<String, StructType<'ctx>>,
    /// Innermost block last
    pub scopes: Vec<HashMap<String, Variable<'ctx>>>,
    /// Interned string literals
    pub strings: HashMap<String, PointerValue<'ctx>>,
    pub function: Option<FunctionValue<'ctx>>,
}

impl<'a, 'ctx> Compiler<'a, 'ctx> {
    pub fn new(context: &'ctx Context, symtable: &'a SymTable, module_name: &str) -> Self {
        Compiler {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            symtable,
            named_structs: HashMap::new(),
            array_structs: HashMap::new(),
            scopes: vec![],
            strings: HashMap::new(),
            function: None,
        }
    }

    /// Sets the module's target triple and data layout to the host's.
    pub fn configure_target(&self) -> Result<(), CodegenError> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(CodegenError::Target)?;

        let triple = TargetMachine::get_default_triple();
        let target =
            Target::from_triple(&triple).map_err(|error| CodegenError::Target(error.to_string()))?;
        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| CodegenError::Target(format!("{:?}", triple)))?;

        self.module.set_triple(&triple);
        self.module
            .set_data_layout(&machine.get_target_data().get_data_layout());
        Ok(())
    }

    pub fn verify(&self) -> Result<(), CodegenError> {
        self.module
            .verify()
            .map_err(|error| CodegenError::InvalidModule(error.to_string()))
    }

    /// Textual IR of the module.
    pub fn ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn save_module_to_file(&self, output_file: &Path) -> Result<(), CodegenError> {
        self.module
            .print_to_file(output_file)
            .map_err(|error| CodegenError::Write(error.to_string()))
    }

    /// Converts a ghoul type to the LLVM type of its values.
    ///
    /// `void*` lowers to `i8*`. Plain `void` has no value type and is an
    /// error here; signatures handle it separately.
    pub fn convert_type(&mut self, ty: &Type) -> Result<BasicTypeEnum<'ctx>, CodegenError> {
        let base: BasicTypeEnum<'ctx> = if let Some(element) = ty.element_type() {
            self.array_struct(element, ty.realigned)?.into()
        } else {
            match ty.name.as_str() {
                "char" => self.context.i8_type().into(),
                "bool" => self.context.bool_type().into(),
                "int" => self.context.i32_type().into(),
                "float" => self.context.f32_type().into(),
                "void" if ty.pointer_depth > 0 => {
                    return Ok(self.pointer_to(self.context.i8_type().into(), ty.pointer_depth - 1))
                }
                name => self
                    .named_structs
                    .get(name)
                    .copied()
                    .ok_or_else(|| CodegenError::UnknownType(ty.to_string()))?
                    .into(),
            }
        };

        Ok(self.pointer_to(base, ty.pointer_depth))
    }

    fn pointer_to(&self, mut base: BasicTypeEnum<'ctx>, depth: u32) -> BasicTypeEnum<'ctx> {
        for _ in 0..depth {
            base = base.ptr_type(AddressSpace::default()).into();
        }
        base
    }

    /// Returns the struct an array of `element` lowers to, creating it once.
    pub fn array_struct(
        &mut self,
        element: &Type,
        realigned: bool,
    ) -> Result<StructType<'ctx>, CodegenError> {
        let key = format!("[]{}{}", if realigned { "@" } else { "" }, element);
        if let Some(existing) = self.array_structs.get(&key) {
            return Ok(*existing);
        }

        let length = self.context.i32_type().into();
        let body: Vec<BasicTypeEnum<'ctx>> = if realigned {
            let mut body = vec![length, length];
            for field in self.field_types(element)? {
                body.push(field.ptr_type(AddressSpace::default()).into());
            }
            body
        } else {
            let element = self.convert_type(element)?;
            vec![element.ptr_type(AddressSpace::default()).into(), length, length]
        };

        let array = self.context.opaque_struct_type(&key);
        array.set_body(&body, false);
        self.array_structs.insert(key, array);
        Ok(array)
    }

    /// Member types of a struct in layout order.
    pub fn field_types(&mut self, ty: &Type) -> Result<Vec<BasicTypeEnum<'ctx>>, CodegenError> {
        let members: Vec<Type> = self
            .symtable
            .layout(&ty.name)
            .ok_or_else(|| CodegenError::UnknownType(ty.to_string()))?
            .into_iter()
            .map(|member| member.ty.clone())
            .collect();

        members
            .iter()
            .map(|member| self.convert_type(member))
            .collect()
    }

    pub fn function_type(
        &mut self,
        signature: &FunctionSignature,
    ) -> Result<FunctionType<'ctx>, CodegenError> {
        let mut parameters: Vec<BasicMetadataTypeEnum<'ctx>> = vec![];
        for parameter in signature.fixed_parameters() {
            parameters.push(self.convert_type(parameter)?.into());
        }

        let variadic = signature.is_variadic();
        if signature.return_type.is_void() {
            return Ok(self.context.void_type().fn_type(&parameters, variadic));
        }

        Ok(self
            .convert_type(&signature.return_type)?
            .fn_type(&parameters, variadic))
    }

    /// Declares a function or extern, reusing an existing declaration.
    pub fn declare_function(
        &mut self,
        signature: &FunctionSignature,
    ) -> Result<FunctionValue<'ctx>, CodegenError> {
        if let Some(function) = self.module.get_function(&signature.name) {
            return Ok(function);
        }

        let function_type = self.function_type(signature)?;
        Ok(self
            .module
            .add_function(&signature.name, function_type, Some(Linkage::External)))
    }

    /// Declares a C runtime function such as `malloc` on first use.
    pub fn runtime_function(
        &self,
        name: &str,
        function_type: FunctionType<'ctx>,
    ) -> FunctionValue<'ctx> {
        self.module
            .get_function(name)
            .unwrap_or_else(|| self.module.add_function(name, function_type, Some(Linkage::External)))
    }

    /// Allocates a stack slot in the entry block of the current function.
    pub fn create_entry_alloca(
        &self,
        ty: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>, CodegenError> {
        let entry = self
            .function
            .and_then(|function| function.get_first_basic_block());

        let Some(entry) = entry else {
            return Ok(self.builder.build_alloca(ty, name)?);
        };

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(ty, name)?)
    }

    pub fn create_basic_block(&self, name: &str) -> Result<BasicBlock<'ctx>, CodegenError> {
        let function = self
            .function
            .ok_or_else(|| CodegenError::UnknownFunction(name.to_string()))?;

        Ok(self.context.append_basic_block(function, name))
    }

    /// Whether the block being filled already ends in a branch or return.
    pub fn is_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn close_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare_variable(&mut self, name: &str, variable: Variable<'ctx>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), variable);
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Variable<'ctx>, CodegenError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| CodegenError::UnknownVariable(name.to_string()))
    }

    /// Declares every struct type, then fills in their bodies in layout
    /// order so members may refer to each other.
    fn declare_structs(&mut self, toplevel: &Toplevel) -> Result<(), CodegenError> {
        for decl in toplevel.structs() {
            if !self.named_structs.contains_key(&decl.name) {
                let ty = self.context.opaque_struct_type(&decl.name);
                self.named_structs.insert(decl.name.clone(), ty);
            }
        }

        for decl in toplevel.structs() {
            let body = self.field_types(&Type::named(&decl.name))?;
            if let Some(ty) = self.named_structs.get(&decl.name) {
                ty.set_body(&body, false);
            }
        }

        Ok(())
    }

    fn add_function_attributes(&self, function: FunctionValue<'ctx>) {
        let attributes = [
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0),
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("uwtable"), 0),
        ];

        for attribute in attributes {
            function.add_attribute(AttributeLoc::Function, attribute);
        }
    }
}

impl<'a, 'ctx> Visitor for Compiler<'a, 'ctx> {
    type Output = GenResult<'ctx>;

    fn visit_toplevel(&mut self, node: &Toplevel) -> GenResult<'ctx> {
        self.declare_structs(node)?;

        for decl in node.externs() {
            self.visit_extern(decl)?;
        }
        for decl in node.functions() {
            let function = self.declare_function(&decl.signature)?;
            self.add_function_attributes(function);
        }

        for decl in node.functions() {
            self.visit_function(decl)?;
        }

        Ok(None)
    }

    fn visit_link(&mut self, _node: &LinkStmt) -> GenResult<'ctx> {
        Ok(None)
    }

    fn visit_struct(&mut self, _node: &StructDeclStmt) -> GenResult<'ctx> {
        Ok(None)
    }

    fn visit_function(&mut self, node: &FnDeclStmt) -> GenResult<'ctx> {
        debug!(function = %node.signature.name, "generating function");
        stmt::gen_function(self, node)
    }

    fn visit_extern(&mut self, node: &ExternDeclStmt) -> GenResult<'ctx> {
        self.declare_function(&node.signature)?;
        Ok(None)
    }

    fn visit_var_decl(&mut self, node: &VarDeclStmt) -> GenResult<'ctx> {
        stmt::gen_var_decl(self, node)
    }

    fn visit_return(&mut self, node: &ReturnStmt) -> GenResult<'ctx> {
        stmt::gen_return(self, node)
    }

    fn visit_branch(&mut self, node: &BranchStmt) -> GenResult<'ctx> {
        stmt::gen_branch(self, node)
    }

    fn visit_loop(&mut self, node: &LoopStmt) -> GenResult<'ctx> {
        stmt::gen_loop(self, node)
    }

    fn visit_call(&mut self, node: &CallExpr) -> GenResult<'ctx> {
        expr::gen_call(self, node)
    }

    fn visit_binary(&mut self, node: &BinaryExpr) -> GenResult<'ctx> {
        expr::gen_binary(self, node).map(Some)
    }

    fn visit_unary(&mut self, node: &UnaryExpr) -> GenResult<'ctx> {
        expr::gen_unary(self, node).map(Some)
    }

    fn visit_cast(&mut self, node: &CastExpr) -> GenResult<'ctx> {
        expr::gen_cast(self, node).map(Some)
    }

    fn visit_array_literal(&mut self, node: &ArrayLiteralExpr) -> GenResult<'ctx> {
        expr::gen_array_literal(self, node).map(Some)
    }

    fn visit_index(&mut self, node: &IndexExpr) -> GenResult<'ctx> {
        let pointer = expr::gen_index_address(self, node)?;
        let ty = self.convert_type(&node.ty)?;
        Ok(Some(self.builder.build_load(ty, pointer, "element")?))
    }

    fn visit_member(&mut self, node: &MemberExpr) -> GenResult<'ctx> {
        let pointer = expr::gen_member_address(self, node)?;
        let ty = self.convert_type(&node.ty)?;
        Ok(Some(self.builder.build_load(ty, pointer, &node.member)?))
    }

    fn visit_variable(&mut self, node: &VariableExpr) -> GenResult<'ctx> {
        let variable = self.lookup(&node.identifier)?.clone();
        let ty = self.convert_type(&variable.ty)?;
        Ok(Some(
            self.builder
                .build_load(ty, variable.pointer, &node.identifier)?,
        ))
    }

    fn visit_string(&mut self, node: &StringExpr) -> GenResult<'ctx> {
        if let Some(existing) = self.strings.get(&node.value) {
            return Ok(Some((*existing).into()));
        }

        let pointer = self
            .builder
            .build_global_string_ptr(&node.value, "str")?
            .as_pointer_value();
        self.strings.insert(node.value.clone(), pointer);
        Ok(Some(pointer.into()))
    }

    fn visit_int(&mut self, node: &IntExpr) -> GenResult<'ctx> {
        Ok(Some(
            self.context
                .i32_type()
                .const_int(node.value as i64 as u64, true)
                .into(),
        ))
    }

    fn visit_float(&mut self, node: &FloatExpr) -> GenResult<'ctx> {
        Ok(Some(self.context.f32_type().const_float(node.value).into()))
    }

    fn visit_bool(&mut self, node: &BoolExpr) -> GenResult<'ctx> {
        Ok(Some(
            self.context
                .bool_type()
                .const_int(node.value as u64, false)
                .into(),
        ))
    }
}

/// Lowers an analyzed program into a fresh LLVM module.
///
/// # Arguments
///
/// * `context` - LLVM context owning the module
/// * `toplevel` - The analyzed program
/// * `symtable` - Symbol table produced by analyzing `toplevel`
/// * `module_name` - Name given to the LLVM module
///
/// # Returns
///
/// The verified module.
pub fn compile<'ctx>(
    context: &'ctx Context,
    toplevel: &Toplevel,
    symtable: &SymTable,
    module_name: &str,
) -> Result<Module<'ctx>, CodegenError> {
    let mut compiler = Compiler::new(context, symtable, module_name);

    compiler.configure_target()?;
    toplevel.accept(&mut compiler)?;
    compiler.verify()?;

    Ok(compiler.module)
}
