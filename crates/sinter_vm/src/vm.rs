//! Stack-based interpreter for SVML bytecode.
//!
//! The VM executes one program at a time against a [`Heap`] it owns.
//!
//! # Frames
//!
//! The executing function's state (program counter, environment, stack
//! base) lives in the VM itself; calls push the caller's state as a
//! [`Frame`] and returns pop it. Tail calls reuse the current frame, so
//! loops written as tail recursion run in constant frame depth.
//!
//! Primitives that take functions (`map`, `accumulate`, stream tails) call
//! back into bytecode through [`Vm::call_value`], which pushes a *boundary*
//! frame and runs a nested dispatch loop until that frame returns.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]

mod native;

pub use native::{PRIMITIVE_COUNT, primitive_arity, primitive_id, primitive_name};

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sinter_foundation::{
    Error, ErrorContext, ErrorKind, ExecutionLimit, HeapId, Result, Type, Value,
};
use sinter_heap::{Heap, HeapObject, Thunk};

use crate::config::VmConfig;
use crate::opcode::Opcode;
use crate::output::{OutputSink, StdSink};
use crate::program::{FUNCTION_HEADER_LEN, Program};

/// An embedder-registered function callable with `call.v`.
pub type InternalFn = fn(&mut Vm, &[Value]) -> Result<Value>;

/// How often the cancellation flag is polled, in steps.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Saved state of a suspended caller.
#[derive(Debug, Clone, Copy)]
struct Frame {
    return_pc: usize,
    env: HeapId,
    function: u32,
    base: usize,
    /// Returning through this frame ends the innermost dispatch loop.
    boundary: bool,
}

/// How a closure is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Call,
    TailCall,
    Boundary,
}

/// A resolved callee.
#[derive(Debug, Clone, Copy)]
enum Callee {
    Closure { function: u32, env: HeapId },
    Primitive(u8),
    Internal(u8),
    Thunk(Thunk),
}

/// Thread-safe handle that stops a run at its next poll point.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation of the current run.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Stack-based virtual machine.
pub struct Vm {
    /// Object heap.
    heap: Heap,
    /// Bounds and knobs.
    config: VmConfig,
    /// Functions addressed by `call.v` and `new.c.v`.
    internals: Vec<InternalFn>,
    /// Destination of `display` and diagnostics.
    output: Box<dyn OutputSink>,
    /// Source of `math_random`.
    rng: ChaCha8Rng,
    /// Cancellation flag shared with the embedder.
    cancel: CancelHandle,

    /// Program being executed.
    program: Option<Rc<Program>>,
    /// Operand stack.
    stack: Vec<Value>,
    /// Suspended callers.
    frames: Vec<Frame>,
    /// Next instruction.
    pc: usize,
    /// Instruction currently executing.
    instr_pc: usize,
    /// Header address of the executing function.
    function: u32,
    /// Current environment.
    env: Option<HeapId>,
    /// Lowest stack index owned by the executing function.
    base: usize,
    /// Instructions executed (plus native work) in this run.
    steps: u64,
    /// Start of the current run.
    started: Instant,
    /// Nesting of primitive-to-function calls.
    native_depth: usize,
}

impl Vm {
    /// Creates a VM over `heap` that writes to the process's standard streams.
    #[must_use]
    pub fn new(heap: Heap, config: VmConfig) -> Self {
        let rng = seeded_rng(config.random_seed);
        Self {
            heap,
            config,
            internals: Vec::new(),
            output: Box::new(StdSink),
            rng,
            cancel: CancelHandle::default(),
            program: None,
            stack: Vec::with_capacity(256),
            frames: Vec::new(),
            pc: 0,
            instr_pc: 0,
            function: 0,
            env: None,
            base: 0,
            steps: 0,
            started: Instant::now(),
            native_depth: 0,
        }
    }

    /// Builder method to redirect output.
    #[must_use]
    pub fn with_output(mut self, output: impl OutputSink + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Replaces the output sink.
    pub fn set_output(&mut self, output: impl OutputSink + 'static) {
        self.output = Box::new(output);
    }

    /// Borrows the output sink.
    pub fn output(&mut self) -> &mut dyn OutputSink {
        self.output.as_mut()
    }

    /// Borrows the heap.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Mutably borrows the heap.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Replaces the configuration, reseeding `math_random`.
    pub fn set_config(&mut self, config: VmConfig) {
        self.rng = seeded_rng(config.random_seed);
        self.config = config;
    }

    /// Registers an internal function and returns its index.
    pub fn register_internal(&mut self, function: InternalFn) -> Result<u8> {
        let index = u8::try_from(self.internals.len())
            .map_err(|_| Error::internal("internal function table is full"))?;
        self.internals.push(function);
        Ok(index)
    }

    /// Returns a handle that cancels runs of this VM.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Instructions executed by the most recent run.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Milliseconds since the current run started.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    // =========================================================================
    // Running programs
    // =========================================================================

    /// Runs a program to completion and returns the entry function's result.
    ///
    /// On an error halt a single diagnostic is written to standard error and
    /// the error is returned with the faulting location attached. Objects
    /// created by the run stay on the heap until the caller clears it.
    pub fn run(&mut self, program: Rc<Program>) -> Result<Value> {
        self.reset_state();
        self.started = Instant::now();
        let entry = program.entry();
        self.program = Some(program);

        let span = tracing::debug_span!("run", entry);
        let _guard = span.enter();
        tracing::debug!("run started");

        let result = self.start(entry).and_then(|()| self.execute());
        let result = result.map_err(|err| self.locate(err));

        match &result {
            Ok(_) => tracing::debug!(steps = self.steps, "run finished"),
            Err(err) => {
                tracing::warn!(steps = self.steps, fault = %err.fault(), %err, "run halted");
                let mut diagnostic = format!("{err} (fault {})", err.fault().code());
                if let Some(context) = &err.context {
                    diagnostic.push_str(&format!("\n  {context}"));
                }
                diagnostic.push('\n');
                self.output.stderr(&diagnostic);
            }
        }

        self.program = None;
        self.stack.clear();
        self.frames.clear();
        self.env = None;
        self.cancel.reset();
        result
    }

    fn reset_state(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.pc = 0;
        self.instr_pc = 0;
        self.function = 0;
        self.env = None;
        self.base = 0;
        self.steps = 0;
        self.native_depth = 0;
    }

    fn start(&mut self, entry: u32) -> Result<()> {
        let header = self.program()?.function(entry)?;
        let env = self.new_environment(None, header.env_size, &[])?;
        self.function = entry;
        self.env = Some(env);
        self.pc = entry as usize + FUNCTION_HEADER_LEN;
        Ok(())
    }

    /// Attaches the faulting location to an error.
    fn locate(&self, err: Error) -> Error {
        if err.context.is_some() {
            return err;
        }
        let mut context = ErrorContext::new()
            .with_pc(self.instr_pc)
            .with_function(self.function as usize);
        for frame in self.frames.iter().rev() {
            context = context.with_frame(frame.return_pc);
        }
        err.with_context(context)
    }

    fn program(&self) -> Result<&Program> {
        self.program
            .as_deref()
            .ok_or_else(|| Error::internal("no program is running"))
    }

    fn current_env(&self) -> Result<HeapId> {
        self.env
            .ok_or_else(|| Error::internal("no environment is active"))
    }

    /// Counts one unit of work against the step budget and polls for
    /// cancellation.
    pub(crate) fn charge_step(&mut self) -> Result<()> {
        self.steps += 1;
        if let Some(limit) = self.config.step_limit {
            if self.steps > limit {
                return Err(Error::limit_exceeded(ExecutionLimit::Steps { limit }));
            }
        }
        if self.steps % CANCEL_POLL_INTERVAL == 0 && self.cancel.is_cancelled() {
            return Err(Error::limit_exceeded(ExecutionLimit::Cancelled));
        }
        Ok(())
    }

    // =========================================================================
    // Dispatch loop
    // =========================================================================

    /// Executes until the outermost or innermost boundary frame returns.
    fn execute(&mut self) -> Result<Value> {
        let program = self
            .program
            .clone()
            .ok_or_else(|| Error::internal("no program is running"))?;

        loop {
            self.charge_step()?;
            self.instr_pc = self.pc;
            let (op, len) = program.decode(self.pc)?;
            self.pc += len;
            tracing::trace!(pc = self.instr_pc, ?op, "step");

            match op {
                Opcode::Nop => {}
                Opcode::Number(n) => self.push(Value::Number(n))?,
                Opcode::Boolean(b) => self.push(Value::Boolean(b))?,
                Opcode::Undefined => self.push(Value::Undefined)?,
                Opcode::Null => self.push(Value::Null)?,
                Opcode::String(address) => {
                    let text = program.string_constant(address)?;
                    let s = self.heap.string(text)?;
                    self.push(s)?;
                }
                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::Dup => {
                    let v = self.peek()?;
                    self.push(v)?;
                }

                Opcode::Add => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let r = self.add(a, b)?;
                    self.push(r)?;
                }
                Opcode::Sub => self.arithmetic(|a, b| a - b)?,
                Opcode::Mul => self.arithmetic(|a, b| a * b)?,
                Opcode::Div => self.arithmetic(|a, b| a / b)?,
                Opcode::Mod => self.arithmetic(|a, b| a % b)?,
                Opcode::Neg => {
                    let v = self.pop()?;
                    let n = self.number(v)?;
                    self.push(Value::Number(-n))?;
                }
                Opcode::Not => {
                    let v = self.pop()?;
                    let b = self.boolean(v)?;
                    self.push(Value::Boolean(!b))?;
                }
                Opcode::Lt => self.compare(|o| o.is_lt())?,
                Opcode::Gt => self.compare(|o| o.is_gt())?,
                Opcode::Le => self.compare(|o| o.is_le())?,
                Opcode::Ge => self.compare(|o| o.is_ge())?,
                Opcode::Eq | Opcode::Neq => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let same = self.heap.strict_equal(a, b)?;
                    self.push(Value::Boolean(same == (op == Opcode::Eq)))?;
                }

                Opcode::NewClosure(function) => {
                    program.function(function)?;
                    let env = self.current_env()?;
                    let id = self.heap.alloc(HeapObject::Closure { function, env })?;
                    self.push(Value::Reference(id))?;
                }
                Opcode::NewArray => {
                    let a = self.heap.array(Vec::new())?;
                    self.push(a)?;
                }
                Opcode::LoadArray => {
                    let index = self.pop()?;
                    let array = self.pop()?;
                    let index = self.array_index(index)?;
                    let v = self.heap.element(array, index)?;
                    self.push(v)?;
                }
                Opcode::StoreArray => {
                    let value = self.pop()?;
                    let index = self.pop()?;
                    let array = self.pop()?;
                    let index = self.array_index(index)?;
                    self.heap.set_element(array, index, value)?;
                }
                Opcode::NewPrimitive(id) => {
                    native::primitive(id)
                        .ok_or_else(|| Error::unbound_reference(format!("primitive {id}")))?;
                    let f = self.heap.alloc(HeapObject::Primitive(id))?;
                    self.push(Value::Reference(f))?;
                }
                Opcode::NewInternal(id) => {
                    if usize::from(id) >= self.internals.len() {
                        return Err(Error::unbound_reference(format!("internal function {id}")));
                    }
                    let f = self.heap.alloc(HeapObject::Internal(id))?;
                    self.push(Value::Reference(f))?;
                }

                Opcode::LoadLocal(index) => {
                    let env = self.current_env()?;
                    let v = self.load_slot(env, index)?;
                    self.push(v)?;
                }
                Opcode::StoreLocal(index) => {
                    let v = self.pop()?;
                    let env = self.current_env()?;
                    self.store_slot(env, index, v)?;
                }
                Opcode::LoadParent { index, depth } => {
                    let env = self.ancestor(depth)?;
                    let v = self.load_slot(env, index)?;
                    self.push(v)?;
                }
                Opcode::StoreParent { index, depth } => {
                    let v = self.pop()?;
                    let env = self.ancestor(depth)?;
                    self.store_slot(env, index, v)?;
                }
                Opcode::NewEnv(size) => {
                    let parent = self.current_env()?;
                    let env = self.new_environment(Some(parent), size, &[])?;
                    self.env = Some(env);
                }
                Opcode::PopEnv => {
                    let env = self.current_env()?;
                    match self.heap.get(env)? {
                        HeapObject::Environment {
                            parent: Some(parent),
                            ..
                        } => self.env = Some(*parent),
                        _ => {
                            return Err(Error::invalid_program(
                                "popenv from the outermost environment",
                            ));
                        }
                    }
                }

                Opcode::BranchIf { when, offset } => {
                    let v = self.pop()?;
                    if self.boolean(v)? == when {
                        self.jump_relative(offset)?;
                    }
                }
                Opcode::Branch(offset) => self.jump_relative(offset)?,
                Opcode::Jump(address) => self.pc = address as usize,

                Opcode::Call { argc, tail } => {
                    let args = self.pop_args(argc)?;
                    let callee = self.pop()?;
                    if let Some(result) = self.apply(callee, &args, tail)? {
                        return Ok(result);
                    }
                }
                Opcode::CallPrimitive { id, argc, tail } => {
                    let args = self.pop_args(argc)?;
                    let result = self.call_primitive(id, &args)?;
                    if let Some(result) = self.finish_native(result, tail)? {
                        return Ok(result);
                    }
                }
                Opcode::CallInternal { id, argc, tail } => {
                    let args = self.pop_args(argc)?;
                    let result = self.call_internal(id, &args)?;
                    if let Some(result) = self.finish_native(result, tail)? {
                        return Ok(result);
                    }
                }
                Opcode::Return => {
                    let v = self.pop()?;
                    if let Some(result) = self.leave(v)? {
                        return Ok(result);
                    }
                }
                Opcode::ReturnUndefined => {
                    if let Some(result) = self.leave(Value::Undefined)? {
                        return Ok(result);
                    }
                }
                Opcode::ReturnNull => {
                    if let Some(result) = self.leave(Value::Null)? {
                        return Ok(result);
                    }
                }
            }
        }
    }

    fn jump_relative(&mut self, offset: i32) -> Result<()> {
        let target = self.pc as i64 + i64::from(offset);
        self.pc = usize::try_from(target).map_err(|_| {
            Error::invalid_program(format!("branch from 0x{:x} leaves the image", self.instr_pc))
        })?;
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn callee(&self, f: Value) -> Result<Callee> {
        match self.heap.object(f)? {
            Some(HeapObject::Closure { function, env }) => Ok(Callee::Closure {
                function: *function,
                env: *env,
            }),
            Some(HeapObject::Primitive(id)) => Ok(Callee::Primitive(*id)),
            Some(HeapObject::Internal(id)) => Ok(Callee::Internal(*id)),
            Some(HeapObject::Thunk(thunk)) => Ok(Callee::Thunk(*thunk)),
            _ => Err(self.heap.mismatch(Type::Function, f)),
        }
    }

    /// Calls a value from bytecode. Returns `Some` when the call ended the
    /// current dispatch loop.
    fn apply(&mut self, f: Value, args: &[Value], tail: bool) -> Result<Option<Value>> {
        match self.callee(f)? {
            Callee::Closure { function, env } => {
                let entry = if tail { Entry::TailCall } else { Entry::Call };
                self.enter_closure(function, env, args, entry)?;
                Ok(None)
            }
            Callee::Primitive(id) => {
                let result = self.call_primitive(id, args)?;
                self.finish_native(result, tail)
            }
            Callee::Internal(id) => {
                let result = self.call_internal(id, args)?;
                self.finish_native(result, tail)
            }
            Callee::Thunk(thunk) => {
                let result = self.force(thunk, args)?;
                self.finish_native(result, tail)
            }
        }
    }

    /// Calls any callable value from native code and returns its result.
    ///
    /// Closures run in a nested dispatch loop; the depth of such nesting is
    /// bounded by `max_native_depth`.
    pub fn call_value(&mut self, f: Value, args: &[Value]) -> Result<Value> {
        let limit = self.config.max_native_depth;
        if self.native_depth >= limit {
            return Err(Error::new(ErrorKind::StackOverflow { limit }));
        }
        self.native_depth += 1;
        let result = self.invoke(f, args);
        self.native_depth -= 1;
        result
    }

    fn invoke(&mut self, f: Value, args: &[Value]) -> Result<Value> {
        match self.callee(f)? {
            Callee::Closure { function, env } => {
                self.enter_closure(function, env, args, Entry::Boundary)?;
                self.execute()
            }
            Callee::Primitive(id) => self.call_primitive(id, args),
            Callee::Internal(id) => self.call_internal(id, args),
            Callee::Thunk(thunk) => self.force(thunk, args),
        }
    }

    fn enter_closure(
        &mut self,
        function: u32,
        env: HeapId,
        args: &[Value],
        entry: Entry,
    ) -> Result<()> {
        let header = self.program()?.function(function)?;
        if args.len() != usize::from(header.num_args) {
            return Err(Error::arity_mismatch(
                header.num_args.to_string(),
                args.len(),
            ));
        }
        let frame_env = self.new_environment(Some(env), header.env_size, args)?;

        if entry == Entry::TailCall {
            self.stack.truncate(self.base);
        } else {
            let limit = self.config.max_call_depth;
            if self.frames.len() >= limit {
                return Err(Error::new(ErrorKind::StackOverflow { limit }));
            }
            self.frames.push(Frame {
                return_pc: self.pc,
                env: self.current_env()?,
                function: self.function,
                base: self.base,
                boundary: entry == Entry::Boundary,
            });
            self.base = self.stack.len();
        }

        self.function = function;
        self.env = Some(frame_env);
        self.pc = function as usize + FUNCTION_HEADER_LEN;
        Ok(())
    }

    fn call_primitive(&mut self, id: u8, args: &[Value]) -> Result<Value> {
        let def = native::primitive(id)
            .ok_or_else(|| Error::unbound_reference(format!("primitive {id}")))?;
        if !def.arity.accepts(args.len()) {
            return Err(Error::arity_mismatch(def.arity.to_string(), args.len()));
        }
        (def.func)(self, args)
    }

    fn call_internal(&mut self, id: u8, args: &[Value]) -> Result<Value> {
        let function = *self
            .internals
            .get(usize::from(id))
            .ok_or_else(|| Error::unbound_reference(format!("internal function {id}")))?;
        function(self, args)
    }

    fn force(&mut self, thunk: Thunk, args: &[Value]) -> Result<Value> {
        if !args.is_empty() {
            return Err(Error::arity_mismatch("0", args.len()));
        }
        native::force(self, thunk)
    }

    /// Pushes a native result, or returns it from the current function for
    /// tail calls.
    fn finish_native(&mut self, result: Value, tail: bool) -> Result<Option<Value>> {
        if tail {
            self.leave(result)
        } else {
            self.push(result)?;
            Ok(None)
        }
    }

    /// Returns `value` to the suspended caller. Returns `Some` when the
    /// dispatch loop should stop.
    fn leave(&mut self, value: Value) -> Result<Option<Value>> {
        self.stack.truncate(self.base);
        let Some(frame) = self.frames.pop() else {
            return Ok(Some(value));
        };
        self.pc = frame.return_pc;
        self.env = Some(frame.env);
        self.function = frame.function;
        self.base = frame.base;
        if frame.boundary {
            return Ok(Some(value));
        }
        self.push(value)?;
        Ok(None)
    }

    // =========================================================================
    // Environments
    // =========================================================================

    fn new_environment(
        &mut self,
        parent: Option<HeapId>,
        size: u8,
        args: &[Value],
    ) -> Result<HeapId> {
        let mut slots = vec![Value::Undefined; usize::from(size).max(args.len())];
        slots[..args.len()].copy_from_slice(args);
        self.heap.alloc(HeapObject::Environment { parent, slots })
    }

    fn ancestor(&self, depth: u8) -> Result<HeapId> {
        let mut env = self.current_env()?;
        for walked in 0..depth {
            match self.heap.get(env)? {
                HeapObject::Environment {
                    parent: Some(parent),
                    ..
                } => env = *parent,
                _ => {
                    return Err(Error::new(ErrorKind::IndexOutOfBounds {
                        index: usize::from(depth),
                        length: usize::from(walked),
                    }));
                }
            }
        }
        Ok(env)
    }

    fn load_slot(&self, env: HeapId, index: u8) -> Result<Value> {
        let HeapObject::Environment { slots, .. } = self.heap.get(env)? else {
            return Err(Error::internal(format!("{env} is not an environment")));
        };
        slots.get(usize::from(index)).copied().ok_or_else(|| {
            Error::new(ErrorKind::IndexOutOfBounds {
                index: usize::from(index),
                length: slots.len(),
            })
        })
    }

    fn store_slot(&mut self, env: HeapId, index: u8, value: Value) -> Result<()> {
        let HeapObject::Environment { slots, .. } = self.heap.get_mut(env)? else {
            return Err(Error::internal(format!("{env} is not an environment")));
        };
        let length = slots.len();
        let slot = slots
            .get_mut(usize::from(index))
            .ok_or_else(|| {
                Error::new(ErrorKind::IndexOutOfBounds {
                    index: usize::from(index),
                    length,
                })
            })?;
        *slot = value;
        Ok(())
    }

    // =========================================================================
    // Operand stack
    // =========================================================================

    fn push(&mut self, value: Value) -> Result<()> {
        let limit = self.config.max_stack;
        if self.stack.len() >= limit {
            return Err(Error::new(ErrorKind::StackOverflow { limit }));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value> {
        if self.stack.len() <= self.base {
            return Err(Error::new(ErrorKind::StackUnderflow));
        }
        self.stack
            .pop()
            .ok_or_else(|| Error::new(ErrorKind::StackUnderflow))
    }

    fn peek(&self) -> Result<Value> {
        if self.stack.len() <= self.base {
            return Err(Error::new(ErrorKind::StackUnderflow));
        }
        self.stack
            .last()
            .copied()
            .ok_or_else(|| Error::new(ErrorKind::StackUnderflow))
    }

    fn pop_args(&mut self, argc: u8) -> Result<Vec<Value>> {
        let argc = usize::from(argc);
        if self.stack.len() < self.base + argc {
            return Err(Error::new(ErrorKind::StackUnderflow));
        }
        Ok(self.stack.split_off(self.stack.len() - argc))
    }

    // =========================================================================
    // Operators
    // =========================================================================

    pub(crate) fn number(&self, v: Value) -> Result<f64> {
        v.as_number()
            .ok_or_else(|| self.heap.mismatch(Type::Number, v))
    }

    pub(crate) fn boolean(&self, v: Value) -> Result<bool> {
        v.as_boolean()
            .ok_or_else(|| self.heap.mismatch(Type::Boolean, v))
    }

    fn array_index(&self, v: Value) -> Result<usize> {
        let n = self.number(v)?;
        if n.fract() != 0.0 || n < 0.0 || !n.is_finite() {
            return Err(self.heap.mismatch(Type::Integer, v));
        }
        Ok(n as usize)
    }

    fn arithmetic(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let r = op(self.number(a)?, self.number(b)?);
        self.push(Value::Number(r))
    }

    fn add(&mut self, a: Value, b: Value) -> Result<Value> {
        if let (Value::Number(x), Value::Number(y)) = (a, b) {
            return Ok(Value::Number(x + y));
        }
        let joined = match (self.heap.as_str(a)?, self.heap.as_str(b)?) {
            (Some(x), Some(y)) => format!("{x}{y}"),
            (Some(_), None) => return Err(self.heap.mismatch(Type::String, b)),
            (None, _) if a.is_number() => return Err(self.heap.mismatch(Type::Number, b)),
            (None, _) => return Err(self.heap.mismatch(Type::Number, a)),
        };
        self.heap.string(joined)
    }

    fn compare(&mut self, test: impl Fn(std::cmp::Ordering) -> bool) -> Result<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.partial_cmp(&y).is_some_and(&test),
            _ => match (self.heap.as_str(a)?, self.heap.as_str(b)?) {
                (Some(x), Some(y)) => test(x.cmp(y)),
                (Some(_), None) => return Err(self.heap.mismatch(Type::String, b)),
                (None, _) if a.is_number() => return Err(self.heap.mismatch(Type::Number, b)),
                (None, _) => return Err(self.heap.mismatch(Type::Number, a)),
            },
        };
        self.push(Value::Boolean(result))
    }

    /// Draws a uniform number in `[0, 1)`.
    pub(crate) fn random(&mut self) -> f64 {
        use rand::Rng;
        self.rng.gen_range(0.0..1.0)
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}
