//! Value arena, instruction kinds, and the use-def graph

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

/// Stable identity of a value in a function's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Position in the original program text, attached to instructions for
/// provenance reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Call target of a call instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callee {
    /// Statically resolved callee name
    Direct(String),
    /// Function pointer or unresolved symbol; cannot participate in source
    /// identification
    Indirect,
}

/// Closed set of instruction kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstKind {
    /// Call whose operands are the argument values (the callee is not an
    /// operand)
    Call { callee: Callee },
    Binary { op: String },
    Unary { op: String },
    Load,
    Store,
    Other { mnemonic: String },
}

/// An instruction: a value with operands, located in a basic block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstKind,
    pub operands: SmallVec<[ValueId; 2]>,
    pub location: Option<SourceLocation>,
}

impl Instruction {
    /// Callee name if this is a statically resolved call
    pub fn callee_name(&self) -> Option<&str> {
        match &self.kind {
            InstKind::Call {
                callee: Callee::Direct(name),
            } => Some(name),
            _ => None,
        }
    }

    pub fn mnemonic(&self) -> &str {
        match &self.kind {
            InstKind::Call { .. } => "call",
            InstKind::Binary { op } | InstKind::Unary { op } => op,
            InstKind::Load => "load",
            InstKind::Store => "store",
            InstKind::Other { mnemonic } => mnemonic,
        }
    }
}

/// A value in the arena: function argument, constant, or instruction result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Argument { index: u32, name: String },
    Constant { repr: String },
    Instruction(Instruction),
}

/// Ordered sequence of instructions; the unit of layout inside a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<ValueId>,
}

/// Structural violations of the use-def graph contract
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("user edge from {value} targets {user}, which is outside the value arena")]
    DanglingUser { value: ValueId, user: ValueId },
    #[error("user edge from {value} targets {user}, which is not an instruction")]
    NonInstructionUser { value: ValueId, user: ValueId },
    #[error("{user} is listed as a user of {value} but does not carry it as an operand")]
    PhantomUseEdge { value: ValueId, user: ValueId },
    #[error("{user} has operand {value} but the matching user edge is missing")]
    MissingUseEdge { value: ValueId, user: ValueId },
    #[error("block {block:?} lists {value}, which is not an instruction in the arena")]
    MalformedBlock { block: String, value: ValueId },
}

/// A function: the unit of analysis. Owns its value arena, the use-edge
/// adjacency lists, and the block layout. Read-only to the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    values: Vec<ValueKind>,
    users: Vec<Vec<ValueId>>,
    blocks: Vec<BasicBlock>,
}

impl Function {
    /// Assemble a function from raw parts. `users[v]` must list every
    /// instruction consuming `v` as an operand; [`Function::validate`] checks
    /// that contract. Prefer [`crate::FunctionBuilder`], which maintains it by
    /// construction.
    pub fn from_raw_parts(
        name: impl Into<String>,
        values: Vec<ValueKind>,
        users: Vec<Vec<ValueId>>,
        blocks: Vec<BasicBlock>,
    ) -> Self {
        Self {
            name: name.into(),
            values,
            users,
            blocks,
        }
    }

    /// Number of values in the arena
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, id: ValueId) -> bool {
        id.index() < self.values.len()
    }

    pub fn value(&self, id: ValueId) -> Option<&ValueKind> {
        self.values.get(id.index())
    }

    pub fn instruction(&self, id: ValueId) -> Option<&Instruction> {
        match self.value(id) {
            Some(ValueKind::Instruction(inst)) => Some(inst),
            _ => None,
        }
    }

    /// Instructions consuming `id` as an operand, in construction order.
    /// Unknown ids have no users.
    pub fn users(&self, id: ValueId) -> &[ValueId] {
        self.users.get(id.index()).map_or(&[], Vec::as_slice)
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Instructions in natural block/instruction order
    pub fn instructions(&self) -> impl Iterator<Item = (ValueId, &Instruction)> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
            .filter_map(move |&id| self.instruction(id).map(|inst| (id, inst)))
    }

    /// Function arguments in declaration order
    pub fn arguments(&self) -> impl Iterator<Item = (ValueId, &str)> {
        self.values.iter().enumerate().filter_map(|(idx, kind)| match kind {
            ValueKind::Argument { name, .. } => Some((ValueId(idx as u32), name.as_str())),
            _ => None,
        })
    }

    /// Render a value the way a textual IR dump would
    pub fn render(&self, id: ValueId) -> String {
        match self.value(id) {
            Some(ValueKind::Argument { name, .. }) => format!("{id} = arg {name}"),
            Some(ValueKind::Constant { repr }) => format!("{id} = const {repr}"),
            Some(ValueKind::Instruction(inst)) => {
                let operands: Vec<String> = inst.operands.iter().map(ToString::to_string).collect();
                match &inst.kind {
                    InstKind::Call {
                        callee: Callee::Direct(name),
                    } => format!("{id} = call {name}({})", operands.join(", ")),
                    InstKind::Call {
                        callee: Callee::Indirect,
                    } => format!("{id} = call <indirect>({})", operands.join(", ")),
                    _ => format!("{id} = {} {}", inst.mnemonic(), operands.join(", ")),
                }
            }
            None => format!("{id} = <unknown>"),
        }
    }

    /// Check the structural contract assumed by the taint propagator:
    /// user edges stay inside the arena, target instructions only, and
    /// mirror the operand lists; blocks list instructions only.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (idx, users) in self.users.iter().enumerate() {
            let value = ValueId(idx as u32);
            for &user in users {
                match self.values.get(user.index()) {
                    None => return Err(GraphError::DanglingUser { value, user }),
                    Some(ValueKind::Instruction(inst)) => {
                        if !inst.operands.contains(&value) {
                            return Err(GraphError::PhantomUseEdge { value, user });
                        }
                    }
                    Some(_) => return Err(GraphError::NonInstructionUser { value, user }),
                }
            }
        }

        for block in &self.blocks {
            for &id in &block.instructions {
                if self.instruction(id).is_none() {
                    return Err(GraphError::MalformedBlock {
                        block: block.label.clone(),
                        value: id,
                    });
                }
            }
        }

        for (idx, kind) in self.values.iter().enumerate() {
            if let ValueKind::Instruction(inst) = kind {
                let user = ValueId(idx as u32);
                for &operand in &inst.operands {
                    let mirrored = self
                        .users
                        .get(operand.index())
                        .is_some_and(|users| users.contains(&user));
                    if !mirrored {
                        return Err(GraphError::MissingUseEdge {
                            value: operand,
                            user,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
