use crate::intern::Symbol;

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Symbol,
    pub parent: Symbol,
    pub features: Vec<Feature>,
    pub file: Symbol,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Feature {
    Method(MethodDecl),
    Attribute(AttrDecl),
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: Symbol,
    pub formals: Vec<Formal>,
    pub return_type: Symbol,
    pub body: Expr,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct AttrDecl {
    pub name: Symbol,
    pub type_decl: Symbol,
    /// `ExprKind::NoExpr` when the attribute has no initializer.
    pub init: Expr,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Formal {
    pub name: Symbol,
    pub type_decl: Symbol,
    pub line: usize,
}

/// Identity of an expression node, unique within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub line: usize,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntConst(i64),
    BoolConst(bool),
    StringConst(String),
    Object(Symbol),
    Assign {
        name: Symbol,
        value: Box<Expr>,
    },
    /// `receiver@type_name.method(args)`
    StaticDispatch {
        receiver: Box<Expr>,
        type_name: Symbol,
        method: Symbol,
        args: Vec<Expr>,
    },
    /// `receiver.method(args)`
    Dispatch {
        receiver: Box<Expr>,
        method: Symbol,
        args: Vec<Expr>,
    },
    Cond {
        pred: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Loop {
        pred: Box<Expr>,
        body: Box<Expr>,
    },
    Block(Vec<Expr>),
    Let {
        name: Symbol,
        type_decl: Symbol,
        init: Box<Expr>,
        body: Box<Expr>,
    },
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
    },
    New(Symbol),
    IsVoid(Box<Expr>),
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Eq {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Integer complement `~e`.
    Neg(Box<Expr>),
    /// Boolean `not e`.
    Not(Box<Expr>),
    NoExpr,
}

#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub name: Symbol,
    pub type_decl: Symbol,
    pub body: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

impl Expr {
    pub fn is_no_expr(&self) -> bool {
        matches!(self.kind, ExprKind::NoExpr)
    }
}

impl ClassDecl {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.features.iter().filter_map(|f| match f {
            Feature::Method(m) => Some(m),
            Feature::Attribute(_) => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttrDecl> {
        self.features.iter().filter_map(|f| match f {
            Feature::Attribute(a) => Some(a),
            Feature::Method(_) => None,
        })
    }
}

impl Program {
    pub fn find_class(&self, name: Symbol) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Append the classes of `other`, keeping expression ids unique only if
    /// both programs were produced from the same [`ExprIdGen`].
    pub fn extend(&mut self, other: Program) {
        self.classes.extend(other.classes);
    }
}

/// Hands out program-unique expression ids. Share one generator across every
/// file of a program so ids never collide.
#[derive(Debug, Default)]
pub struct ExprIdGen {
    next: u32,
}

impl ExprIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }

    pub fn expr(&mut self, line: usize, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            line,
            kind,
        }
    }

    pub fn no_expr(&mut self, line: usize) -> Expr {
        self.expr(line, ExprKind::NoExpr)
    }
}
