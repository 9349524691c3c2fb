//! Compiles the flat instruction list into the executable node tree.
//!
//! A single linear scan with an explicit block stack: stage instructions
//! append to the innermost open body, block starts push a frame, block ends
//! pop one and embed the finished node in its parent. Bodies are therefore
//! fully compiled before being embedded.
//!
//! The compiler is strict about structure: end markers must match the
//! innermost open block (by kind, and by name for loops), and a block left
//! open at end of definition is rejected rather than implicitly closed.
//! Compilation is pure; a definition can be compiled any number of times
//! with identical results.

use super::{
    ConditionalNode, Instruction, LoopNode, LoopSource, Node, ParallelLimit, ParallelNode,
    Predicate, StageNode, WorkflowDefinition,
};
use crate::errors::StructureError;

enum Frame {
    Loop {
        name: String,
        source: LoopSource,
        body: Vec<Node>,
    },
    Conditional {
        predicate: Predicate,
        body: Vec<Node>,
    },
    Parallel {
        limit: ParallelLimit,
        body: Vec<Node>,
    },
}

impl Frame {
    fn kind(&self) -> &'static str {
        match self {
            Self::Loop { .. } => "loop",
            Self::Conditional { .. } => "conditional",
            Self::Parallel { .. } => "parallel",
        }
    }

    fn name(&self) -> Option<String> {
        match self {
            Self::Loop { name, .. } => Some(name.clone()),
            Self::Conditional { .. } | Self::Parallel { .. } => None,
        }
    }
}

/// Compiles a workflow definition into an ordered node sequence.
///
/// # Errors
///
/// Returns a [`StructureError`] for mismatched, stray, or unclosed block
/// markers.
pub fn compile(definition: &WorkflowDefinition) -> Result<Vec<Node>, StructureError> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for instruction in definition.instructions() {
        match instruction.clone() {
            Instruction::Stage { name, stage, opts } => {
                emit(&mut root, &mut stack, Node::Stage(StageNode { name, stage, opts }));
            }
            Instruction::LoopStart { name, source } => {
                stack.push(Frame::Loop {
                    name,
                    source,
                    body: Vec::new(),
                });
            }
            Instruction::LoopEnd { name } => match stack.pop() {
                Some(Frame::Loop {
                    name: open,
                    source,
                    body,
                }) => {
                    if open != name {
                        return Err(StructureError::LoopNameMismatch {
                            expected: open,
                            found: name,
                        });
                    }
                    emit(
                        &mut root,
                        &mut stack,
                        Node::Loop(LoopNode {
                            name: open,
                            source,
                            body,
                        }),
                    );
                }
                Some(other) => {
                    return Err(StructureError::MismatchedEnd {
                        marker: "loop_end",
                        open: other.kind(),
                    });
                }
                None => return Err(StructureError::StrayEnd { marker: "loop_end" }),
            },
            Instruction::ConditionalStart { predicate } => {
                stack.push(Frame::Conditional {
                    predicate,
                    body: Vec::new(),
                });
            }
            Instruction::ConditionalEnd => match stack.pop() {
                Some(Frame::Conditional { predicate, body }) => {
                    emit(
                        &mut root,
                        &mut stack,
                        Node::Conditional(ConditionalNode { predicate, body }),
                    );
                }
                Some(other) => {
                    return Err(StructureError::MismatchedEnd {
                        marker: "conditional_end",
                        open: other.kind(),
                    });
                }
                None => {
                    return Err(StructureError::StrayEnd {
                        marker: "conditional_end",
                    });
                }
            },
            Instruction::ParallelStart { limit } => {
                stack.push(Frame::Parallel {
                    limit,
                    body: Vec::new(),
                });
            }
            Instruction::ParallelEnd => match stack.pop() {
                Some(Frame::Parallel { limit, body }) => {
                    emit(
                        &mut root,
                        &mut stack,
                        Node::Parallel(ParallelNode { limit, body }),
                    );
                }
                Some(other) => {
                    return Err(StructureError::MismatchedEnd {
                        marker: "parallel_end",
                        open: other.kind(),
                    });
                }
                None => {
                    return Err(StructureError::StrayEnd {
                        marker: "parallel_end",
                    });
                }
            },
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(StructureError::UnclosedBlock {
            kind: frame.kind(),
            name: frame.name(),
        });
    }

    Ok(root)
}

fn emit(root: &mut Vec<Node>, stack: &mut [Frame], node: Node) {
    match stack.last_mut() {
        Some(Frame::Loop { body, .. })
        | Some(Frame::Conditional { body, .. })
        | Some(Frame::Parallel { body, .. }) => body.push(node),
        None => root.push(node),
    }
}
