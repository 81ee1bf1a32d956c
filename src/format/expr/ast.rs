// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Abstract syntax tree][1] of `${...}` expressions.
//!
//! [1]: https://en.wikipedia.org/wiki/Abstract_syntax_tree

use std::rc::Rc;

use crate::value::Value;

/// Parsed expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Number, string, boolean, `null` or `undefined` literal.
    Literal(Value),

    /// Backtick string with embedded expressions.
    Template(Vec<TemplatePart>),

    /// Name resolved against local parameters, `colors` and the data record.
    Ident(String),

    /// `[a, b, c]`
    Array(Vec<Expr>),

    /// `object.property`
    Member {
        /// Accessed expression.
        object: Box<Expr>,

        /// Property name.
        property: String,
    },

    /// `object[index]`
    Index {
        /// Accessed expression.
        object: Box<Expr>,

        /// Computed property.
        index: Box<Expr>,
    },

    /// `callee(args...)`
    Call {
        /// Called expression.
        callee: Box<Expr>,

        /// Arguments.
        args: Vec<Expr>,
    },

    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,

        /// Operand.
        operand: Box<Expr>,
    },

    /// Arithmetic, comparison or equality operator.
    Binary {
        /// Operator.
        op: BinaryOp,

        /// Left operand.
        left: Box<Expr>,

        /// Right operand.
        right: Box<Expr>,
    },

    /// Short-circuiting operator.
    Logical {
        /// Operator.
        op: LogicalOp,

        /// Left operand.
        left: Box<Expr>,

        /// Right operand, evaluated only when needed.
        right: Box<Expr>,
    },

    /// `test ? consequent : alternate`
    Conditional {
        /// Condition.
        test: Box<Expr>,

        /// Value if `test` is truthy.
        consequent: Box<Expr>,

        /// Value otherwise.
        alternate: Box<Expr>,
    },

    /// `(a, b) => body`
    Arrow(Rc<Arrow>),
}

/// Piece of a backtick string.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplatePart {
    /// Literal text.
    Text(String),

    /// Embedded `${...}` expression.
    Expr(Expr),
}

/// Arrow function definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrow {
    /// Parameter names.
    pub params: Vec<String>,

    /// Returned expression.
    pub body: Expr,
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `typeof`
    TypeOf,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
}

/// Short-circuiting operators.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}
