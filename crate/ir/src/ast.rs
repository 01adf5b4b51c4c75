use crate::SourceLocation;
use boxc_types::BoxType;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    /// `true` for the operators whose result spec §4.5 forces to `num24`
    /// regardless of the operand type.
    pub fn yields_num24(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
                | BinaryOperator::And
                | BinaryOperator::Or
        )
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op_str = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{op_str}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Deref,
    AddressOf,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op_str = match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Deref => "*",
            UnaryOperator::AddressOf => "&",
        };
        write!(f, "{op_str}")
    }
}

#[derive(Debug, Clone)]
pub struct IntegerLiteralExpr {
    pub value: i64,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct CharacterLiteralExpr {
    pub value: u8,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct StringLiteralExpr {
    pub value: String,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct VariableAccessExpr {
    pub name: String,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub target_type: BoxType,
    pub operand: Box<Expression>,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

/// A call `open [ns::]name [args]`. Used as both an expression and, when
/// followed by `;`, a standalone statement (spec §3, §4.4).
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub namespace: Option<String>,
    pub name: String,
    pub arguments: Vec<Expression>,
    pub var_type: Option<BoxType>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum Expression {
    IntegerLiteral(IntegerLiteralExpr),
    CharacterLiteral(CharacterLiteralExpr),
    StringLiteral(StringLiteralExpr),
    VariableAccess(VariableAccessExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Cast(CastExpr),
    Call(CallExpr),
}

impl Expression {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expression::IntegerLiteral(e) => &e.location,
            Expression::CharacterLiteral(e) => &e.location,
            Expression::StringLiteral(e) => &e.location,
            Expression::VariableAccess(e) => &e.location,
            Expression::Binary(e) => &e.location,
            Expression::Unary(e) => &e.location,
            Expression::Cast(e) => &e.location,
            Expression::Call(e) => &e.location,
        }
    }

    pub fn var_type(&self) -> Option<&BoxType> {
        match self {
            Expression::IntegerLiteral(e) => e.var_type.as_ref(),
            Expression::CharacterLiteral(e) => e.var_type.as_ref(),
            Expression::StringLiteral(e) => e.var_type.as_ref(),
            Expression::VariableAccess(e) => e.var_type.as_ref(),
            Expression::Binary(e) => e.var_type.as_ref(),
            Expression::Unary(e) => e.var_type.as_ref(),
            Expression::Cast(e) => e.var_type.as_ref(),
            Expression::Call(e) => e.var_type.as_ref(),
        }
    }

    pub fn set_var_type(&mut self, ty: BoxType) {
        let slot = match self {
            Expression::IntegerLiteral(e) => &mut e.var_type,
            Expression::CharacterLiteral(e) => &mut e.var_type,
            Expression::StringLiteral(e) => &mut e.var_type,
            Expression::VariableAccess(e) => &mut e.var_type,
            Expression::Binary(e) => &mut e.var_type,
            Expression::Unary(e) => &mut e.var_type,
            Expression::Cast(e) => &mut e.var_type,
            Expression::Call(e) => &mut e.var_type,
        };
        *slot = Some(ty);
    }
}

#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub declared_type: BoxType,
    pub name: String,
    pub initializer: Option<Expression>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct AssignmentStmt {
    pub target: Expression,
    pub value: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct AsmStmt {
    pub code: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Option<Vec<Statement>>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct CaseNode {
    pub value: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub expr: Expression,
    pub cases: Vec<CaseNode>,
    pub default_case: Option<Vec<Statement>>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum Statement {
    VarDecl(VarDeclStmt),
    Assignment(AssignmentStmt),
    Call(CallExpr),
    Asm(AsmStmt),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    Switch(SwitchStmt),
}

impl Statement {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Statement::VarDecl(s) => &s.location,
            Statement::Assignment(s) => &s.location,
            Statement::Call(s) => &s.location,
            Statement::Asm(s) => &s.location,
            Statement::Return(s) => &s.location,
            Statement::If(s) => &s.location,
            Statement::While(s) => &s.location,
            Statement::Switch(s) => &s.location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub param_type: BoxType,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: BoxType,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub name: String,
    pub functions: Vec<FunctionDecl>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Function(FunctionDecl),
    Namespace(NamespaceDecl),
    Variable(VarDeclStmt),
}

impl Declaration {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Declaration::Function(d) => &d.location,
            Declaration::Namespace(d) => &d.location,
            Declaration::Variable(d) => &d.location,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}
