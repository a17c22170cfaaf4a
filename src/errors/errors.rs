use std::{fmt::Display, io::Write};

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// The diagnostic text shown to the user, without the location prefix.
    pub fn message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn get_category(&self) -> ErrorCategory {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnrecognisedEscape { .. }
            | ErrorImpl::UnterminatedString
            | ErrorImpl::IntegerOutOfRange { .. } => ErrorCategory::Lexical,
            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedEndOfFile
            | ErrorImpl::VarWithoutInitializer
            | ErrorImpl::InvalidAssignmentTarget
            | ErrorImpl::StrayExpression
            | ErrorImpl::VariadicNotLast
            | ErrorImpl::ModuleNotFound { .. }
            | ErrorImpl::CyclicImport { .. }
            | ErrorImpl::EmptyModule { .. } => ErrorCategory::Syntactic,
            _ => ErrorCategory::Semantic,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnrecognisedEscape { .. } => "UnrecognisedEscape",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::IntegerOutOfRange { .. } => "IntegerOutOfRange",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedEndOfFile => "UnexpectedEndOfFile",
            ErrorImpl::VarWithoutInitializer => "VarWithoutInitializer",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::StrayExpression => "StrayExpression",
            ErrorImpl::VariadicNotLast => "VariadicNotLast",
            ErrorImpl::ModuleNotFound { .. } => "ModuleNotFound",
            ErrorImpl::CyclicImport { .. } => "CyclicImport",
            ErrorImpl::EmptyModule { .. } => "EmptyModule",
            ErrorImpl::FunctionRedefinition { .. } => "FunctionRedefinition",
            ErrorImpl::TypeRedefinition { .. } => "TypeRedefinition",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::VoidVariable => "VoidVariable",
            ErrorImpl::IdentifierRedefinition { .. } => "IdentifierRedefinition",
            ErrorImpl::VariableRedefinition { .. } => "VariableRedefinition",
            ErrorImpl::MemberRedefinition { .. } => "MemberRedefinition",
            ErrorImpl::UndefinedVariable { .. } => "UndefinedVariable",
            ErrorImpl::UndefinedFunction { .. } => "UndefinedFunction",
            ErrorImpl::SignatureMismatch { .. } => "SignatureMismatch",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::ReturnTypeMismatch { .. } => "ReturnTypeMismatch",
            ErrorImpl::ReturnValueInVoid { .. } => "ReturnValueInVoid",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::AssignmentMismatch { .. } => "AssignmentMismatch",
            ErrorImpl::InvalidOperand { .. } => "InvalidOperand",
            ErrorImpl::CannotDereference => "CannotDereference",
            ErrorImpl::InvalidCast { .. } => "InvalidCast",
            ErrorImpl::ArrayLengthType => "ArrayLengthType",
            ErrorImpl::RealignedElement { .. } => "RealignedElement",
            ErrorImpl::InvalidIndexTarget { .. } => "InvalidIndexTarget",
            ErrorImpl::IndexType => "IndexType",
            ErrorImpl::RealignedIndexWithoutMember => "RealignedIndexWithoutMember",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::ConditionNotBool { .. } => "ConditionNotBool",
            ErrorImpl::RecursiveStruct { .. } => "RecursiveStruct",
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.position, self.internal_error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Syntactic,
    Semantic,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("Unrecognized token '{token}'")]
    UnrecognisedToken { token: String },
    #[error("Unrecognized escape character '\\{escape}'")]
    UnrecognisedEscape { escape: char },
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Integer literal '{token}' out of range")]
    IntegerOutOfRange { token: String },

    #[error("Unexpected token: '{token}'")]
    UnexpectedToken { token: String },
    #[error("Unexpected end of file")]
    UnexpectedEndOfFile,
    #[error("'var' declaration expects an assignment")]
    VarWithoutInitializer,
    #[error("Constant expression or operator result may not appear to the left of an assignment")]
    InvalidAssignmentTarget,
    #[error("Stray expression")]
    StrayExpression,
    #[error("Variadic parameter '...' must be the last parameter")]
    VariadicNotLast,
    #[error("Could not find module '{module}'")]
    ModuleNotFound { module: String },
    #[error("Cyclic import of module '{module}'")]
    CyclicImport { module: String },
    #[error("Module '{module}' does not contain any valid tokens")]
    EmptyModule { module: String },

    #[error("Function redefinition '{function}'")]
    FunctionRedefinition { function: String },
    #[error("Type redefinition '{type_}'")]
    TypeRedefinition { type_: String },
    #[error("Type '{type_}' is not defined")]
    UnknownType { type_: String },
    #[error("May not declare variable of type 'void'")]
    VoidVariable,
    #[error("Redefinition of identifier '{identifier}'")]
    IdentifierRedefinition { identifier: String },
    #[error("Redefinition of variable '{variable}'")]
    VariableRedefinition { variable: String },
    #[error("Redefinition of member '{member}' in '{type_}'")]
    MemberRedefinition { type_: String, member: String },
    #[error("Variable '{variable}' used but never defined")]
    UndefinedVariable { variable: String },
    #[error("Function '{function}' does not exist")]
    UndefinedFunction { function: String },
    #[error("Function call '{call}' does not match function signature of '{signature}'")]
    SignatureMismatch { call: String, signature: String },
    #[error("Function '{function}' does not return a value, expected return of type '{expected}'")]
    MissingReturn { function: String, expected: String },
    #[error("Function '{function}' tries to return value of type '{received}', when definition specifies it to return '{expected}'")]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        received: String,
    },
    #[error("Function '{function}' returns 'void' and may not return a value")]
    ReturnValueInVoid { function: String },
    #[error("Type mismatch, cannot perform '{operator}' with '{left}' and a '{right}'")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },
    #[error("Cannot assign value of type '{received}' to variable of type '{expected}'")]
    AssignmentMismatch { expected: String, received: String },
    #[error("Cannot apply '{operator}' to type '{type_}'")]
    InvalidOperand { operator: String, type_: String },
    #[error("Cannot dereference further")]
    CannotDereference,
    #[error("Cannot cast '{from}' into '{to}'")]
    InvalidCast { from: String, to: String },
    #[error("Array declaration expects length definition to be of type 'int'")]
    ArrayLengthType,
    #[error("Realigned array expects a struct element type, found '{type_}'")]
    RealignedElement { type_: String },
    #[error("Cannot index into type '{type_}'")]
    InvalidIndexTarget { type_: String },
    #[error("Indexing a variable requires the index to be of type 'int'")]
    IndexType,
    #[error("Indexing a realigned array requires selecting a member")]
    RealignedIndexWithoutMember,
    #[error("Type '{type_}' has no member '{member}'")]
    UnknownMember { type_: String, member: String },
    #[error("Cannot translate result of expression of type '{type_}' into type 'bool'")]
    ConditionNotBool { type_: String },
    #[error("Struct '{type_}' contains itself by value")]
    RecursiveStruct { type_: String },
}

/// Ordered collection of diagnostics for one compilation unit.
///
/// Every phase pushes into the same stack. The driver inspects it after each
/// phase and aborts when it is not empty.
#[derive(Debug, Default)]
pub struct ErrorStack {
    errors: Vec<Error>,
}

impl ErrorStack {
    pub fn new() -> Self {
        ErrorStack { errors: vec![] }
    }

    pub fn push(&mut self, error_impl: ErrorImpl, position: Position) {
        self.errors.push(Error::new(error_impl, position));
    }

    pub fn push_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Removes and returns every collected error in push order.
    pub fn drain(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    /// Writes every entry as `<file>:<row>:<col>\n<message>` and empties the stack.
    ///
    /// # Returns
    ///
    /// The number of entries written.
    pub fn unwind<W: Write>(&mut self, out: &mut W) -> std::io::Result<usize> {
        let errors = self.drain();
        for error in &errors {
            writeln!(out, "{}", error)?;
        }

        Ok(errors.len())
    }
}
