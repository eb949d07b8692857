//! Construction of well-formed functions
//!
//! The builder appends values to the arena and wires the use-edge adjacency
//! lists as instructions reference their operands, so a finished function
//! always passes [`Function::validate`]. Operand references to ids that have
//! not been defined yet are host programming errors and panic.

use crate::ir::{
    BasicBlock, Callee, Function, InstKind, Instruction, SourceLocation, ValueId, ValueKind,
};
use smallvec::SmallVec;

pub struct FunctionBuilder {
    name: String,
    values: Vec<ValueKind>,
    users: Vec<Vec<ValueId>>,
    blocks: Vec<BasicBlock>,
    current: usize,
    arg_count: u32,
}

impl FunctionBuilder {
    /// Start a function with an implicit `entry` block
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            users: Vec::new(),
            blocks: vec![BasicBlock {
                label: "entry".to_string(),
                instructions: Vec::new(),
            }],
            current: 0,
            arg_count: 0,
        }
    }

    fn push_value(&mut self, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(kind);
        self.users.push(Vec::new());
        id
    }

    pub fn add_argument(&mut self, name: impl Into<String>) -> ValueId {
        let index = self.arg_count;
        self.arg_count += 1;
        self.push_value(ValueKind::Argument {
            index,
            name: name.into(),
        })
    }

    pub fn add_constant(&mut self, repr: impl Into<String>) -> ValueId {
        self.push_value(ValueKind::Constant { repr: repr.into() })
    }

    /// Open a new block; subsequent instructions land there
    pub fn start_block(&mut self, label: impl Into<String>) {
        self.blocks.push(BasicBlock {
            label: label.into(),
            instructions: Vec::new(),
        });
        self.current = self.blocks.len() - 1;
    }

    fn push_instruction(&mut self, kind: InstKind, operands: &[ValueId]) -> ValueId {
        for &operand in operands {
            assert!(
                operand.index() < self.values.len(),
                "operand {operand} is not defined in function {:?}",
                self.name
            );
        }
        let id = self.push_value(ValueKind::Instruction(Instruction {
            kind,
            operands: SmallVec::from_slice(operands),
            location: None,
        }));
        for &operand in operands {
            let users = &mut self.users[operand.index()];
            if !users.contains(&id) {
                users.push(id);
            }
        }
        self.blocks[self.current].instructions.push(id);
        id
    }

    /// Call with a statically resolved callee; operands are the arguments
    pub fn call(&mut self, callee: impl Into<String>, args: &[ValueId]) -> ValueId {
        self.push_instruction(
            InstKind::Call {
                callee: Callee::Direct(callee.into()),
            },
            args,
        )
    }

    /// Call through a function pointer or unresolved symbol
    pub fn indirect_call(&mut self, args: &[ValueId]) -> ValueId {
        self.push_instruction(
            InstKind::Call {
                callee: Callee::Indirect,
            },
            args,
        )
    }

    pub fn binary(&mut self, op: impl Into<String>, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push_instruction(InstKind::Binary { op: op.into() }, &[lhs, rhs])
    }

    pub fn unary(&mut self, op: impl Into<String>, operand: ValueId) -> ValueId {
        self.push_instruction(InstKind::Unary { op: op.into() }, &[operand])
    }

    pub fn load(&mut self, address: ValueId) -> ValueId {
        self.push_instruction(InstKind::Load, &[address])
    }

    pub fn store(&mut self, value: ValueId, address: ValueId) -> ValueId {
        self.push_instruction(InstKind::Store, &[value, address])
    }

    pub fn other(&mut self, mnemonic: impl Into<String>, operands: &[ValueId]) -> ValueId {
        self.push_instruction(
            InstKind::Other {
                mnemonic: mnemonic.into(),
            },
            operands,
        )
    }

    /// Attach a source location to the most recent instruction
    pub fn location(&mut self, file: impl Into<String>, line: u32, column: u32) {
        let id = *self.blocks[self.current]
            .instructions
            .last()
            .expect("no instruction to attach a location to");
        if let ValueKind::Instruction(inst) = &mut self.values[id.index()] {
            inst.location = Some(SourceLocation::new(file, line, column));
        }
    }

    pub fn finish(self) -> Function {
        Function::from_raw_parts(self.name, self.values, self.users, self.blocks)
    }
}
