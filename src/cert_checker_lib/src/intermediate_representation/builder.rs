//! Builder functions for intermediate representation terms used in unit tests.

use super::*;
use std::collections::BTreeMap;

impl Type {
    pub fn char() -> Type {
        Type::Builtin(BuiltinType::Char)
    }

    pub fn short() -> Type {
        Type::Builtin(BuiltinType::Short)
    }

    pub fn int() -> Type {
        Type::Builtin(BuiltinType::Int)
    }

    pub fn long() -> Type {
        Type::Builtin(BuiltinType::Long)
    }

    pub fn record(name: &str) -> Type {
        Type::Record(name.to_string())
    }

    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn array(element: Type, count: u64) -> Type {
        Type::Array {
            element: Box::new(element),
            count,
        }
    }
}

impl Field {
    /// A public, non-static field that is not a bitfield.
    pub fn new(name: &str, ty: Type) -> Field {
        Field {
            name: Some(name.to_string()),
            ty,
            bit_width: None,
            access: AccessSpecifier::Public,
            is_static: false,
            no_unique_address: false,
        }
    }

    pub fn bitfield(name: &str, ty: Type, width: u64) -> Field {
        Field {
            bit_width: Some(width),
            ..Field::new(name, ty)
        }
    }

    pub fn unnamed_bitfield(ty: Type, width: u64) -> Field {
        Field {
            name: None,
            bit_width: Some(width),
            ..Field::new("", ty)
        }
    }

    pub fn static_member(mut self) -> Field {
        self.is_static = true;
        self
    }

    pub fn with_access(mut self, access: AccessSpecifier) -> Field {
        self.access = access;
        self
    }

    pub fn with_no_unique_address(mut self) -> Field {
        self.no_unique_address = true;
        self
    }
}

impl Record {
    fn mock(name: &str, kind: RecordKind, fields: Vec<Field>) -> Record {
        Record {
            name: name.to_string(),
            kind,
            definition: Some(RecordDefinition {
                bases: Vec::new(),
                fields,
                has_virtual_functions: false,
                max_field_alignment: None,
                layout: None,
            }),
        }
    }

    pub fn mock_struct(name: &str, fields: Vec<Field>) -> Record {
        Record::mock(name, RecordKind::Struct, fields)
    }

    pub fn mock_class(name: &str, fields: Vec<Field>) -> Record {
        Record::mock(name, RecordKind::Class, fields)
    }

    pub fn mock_union(name: &str, fields: Vec<Field>) -> Record {
        Record::mock(name, RecordKind::Union, fields)
    }

    /// A forward declared struct.
    pub fn mock_incomplete(name: &str) -> Record {
        Record {
            name: name.to_string(),
            kind: RecordKind::Struct,
            definition: None,
        }
    }

    fn definition_mut(&mut self) -> &mut RecordDefinition {
        self.definition.as_mut().unwrap()
    }

    /// Add public non-virtual bases.
    pub fn with_bases(mut self, bases: &[&str]) -> Record {
        for base in bases {
            self.definition_mut().bases.push(BaseSpecifier {
                record: base.to_string(),
                access: AccessSpecifier::Public,
                is_virtual: false,
            });
        }
        self
    }

    pub fn with_virtual_base(mut self, base: &str) -> Record {
        self.definition_mut().bases.push(BaseSpecifier {
            record: base.to_string(),
            access: AccessSpecifier::Public,
            is_virtual: true,
        });
        self
    }

    /// Mark the record as having virtual functions.
    pub fn polymorphic(mut self) -> Record {
        self.definition_mut().has_virtual_functions = true;
        self
    }

    /// Simulate `#pragma pack(bytes)`.
    pub fn packed(mut self, bytes: u64) -> Record {
        self.definition_mut().max_field_alignment = Some(ByteSize::new(bytes));
        self
    }
}

impl Project {
    /// A project with an empty program and the given records.
    /// Record layouts are not computed.
    pub fn mock_unnormalized(records: Vec<Record>) -> Project {
        Project {
            program: Term {
                tid: Tid::new("program"),
                term: Program::default(),
            },
            records: records
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
            typedefs: BTreeMap::new(),
            datatype_properties: DatatypeProperties::default(),
        }
    }

    /// A project with an empty program and the given records with computed layouts.
    pub fn mock(records: Vec<Record>) -> Project {
        let mut project = Project::mock_unnormalized(records);
        let _ = project.normalize();
        project
    }

    pub fn with_typedef(mut self, name: &str, ty: Type) -> Project {
        self.typedefs.insert(name.to_string(), ty);
        self
    }

    /// Add a function to the program.
    pub fn with_sub(mut self, sub: Term<Sub>) -> Project {
        self.program.term.subs.push(sub);
        self
    }
}

impl Variable {
    pub fn mock(name: &str, ty: Type) -> Variable {
        Variable {
            name: name.to_string(),
            ty,
        }
    }
}

impl Expression {
    pub fn var(name: &str, ty: Type) -> Expression {
        Expression::Var(Variable::mock(name, ty))
    }

    pub fn implicit_cast(ty: Type, arg: Expression) -> Expression {
        Expression::ImplicitCast {
            ty,
            arg: Box::new(arg),
        }
    }

    /// Shortcut for an explicit cast of `self` to `ty`.
    pub fn cast_to(self, ty: Type) -> Expression {
        Expression::Cast {
            ty,
            arg: Box::new(self),
        }
    }

    /// A call returning `int`.
    pub fn call(target: &str, args: Vec<Expression>) -> Expression {
        Expression::Call {
            target: target.to_string(),
            args,
            ty: Type::int(),
        }
    }

    pub fn address_of(self) -> Expression {
        Expression::AddressOf(Box::new(self))
    }

    pub fn mul(self, rhs: Expression) -> Expression {
        Expression::BinOp {
            op: BinOpType::Mul,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn plus(self, rhs: Expression) -> Expression {
        Expression::BinOp {
            op: BinOpType::Add,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// A `new T[count]` expression.
    pub fn new_array(ty: Type, count: u64) -> Expression {
        Expression::New {
            ty,
            array_size: Some(Box::new(Expression::IntLiteral(count))),
        }
    }

    /// A `new T()` expression.
    pub fn new_object(ty: Type) -> Expression {
        Expression::New {
            ty,
            array_size: None,
        }
    }

    /// A `memcmp(lhs, rhs, size)` call with the implicit conversions of the pointers to `const void *`.
    pub fn memcmp(lhs: Expression, rhs: Expression, size: Expression) -> Expression {
        let to_void_ptr = |arg| Expression::implicit_cast(Type::pointer(Type::Void), arg);
        Expression::call("memcmp", vec![to_void_ptr(lhs), to_void_ptr(rhs), size])
    }
}

impl Stmt {
    pub fn declare(tid: &str, var: Variable, init: Expression) -> Term<Stmt> {
        Term {
            tid: Tid::new(tid).with_address(format!("test.cpp:{tid}")),
            term: Stmt::Declare {
                var,
                init: Some(init),
            },
        }
    }

    pub fn assign(tid: &str, var: Variable, value: Expression) -> Term<Stmt> {
        Term {
            tid: Tid::new(tid).with_address(format!("test.cpp:{tid}")),
            term: Stmt::Assign { var, value },
        }
    }

    pub fn expr(tid: &str, expr: Expression) -> Term<Stmt> {
        Term {
            tid: Tid::new(tid).with_address(format!("test.cpp:{tid}")),
            term: Stmt::Expr(expr),
        }
    }

    pub fn delete(tid: &str, argument: Expression, array_form: bool) -> Term<Stmt> {
        Term {
            tid: Tid::new(tid).with_address(format!("test.cpp:{tid}")),
            term: Stmt::Delete {
                argument,
                array_form,
            },
        }
    }
}

impl Jmp {
    pub fn branch(tid: &str, target: &str) -> Term<Jmp> {
        Term {
            tid: Tid::new(tid),
            term: Jmp::Branch(Tid::new(target)),
        }
    }

    pub fn cbranch(tid: &str, target: &str, condition: Expression) -> Term<Jmp> {
        Term {
            tid: Tid::new(tid),
            term: Jmp::CBranch {
                target: Tid::new(target),
                condition,
            },
        }
    }

    pub fn ret(tid: &str) -> Term<Jmp> {
        Term {
            tid: Tid::new(tid),
            term: Jmp::Return(None),
        }
    }
}

impl Blk {
    pub fn mock(tid: &str, stmts: Vec<Term<Stmt>>, jmps: Vec<Term<Jmp>>) -> Term<Blk> {
        Term {
            tid: Tid::new(tid),
            term: Blk { stmts, jmps },
        }
    }
}

impl Sub {
    pub fn mock(name: &str, params: Vec<Variable>, blocks: Vec<Term<Blk>>) -> Term<Sub> {
        Term {
            tid: Tid::new(name),
            term: Sub {
                name: name.to_string(),
                params,
                blocks,
            },
        }
    }
}
