//! End-to-end scenarios (§8), run through the full out-of-order engine.

use crate::common::harness::TestContext;
use crate::common::reference::run_sequentially;
use apex_core::common::error::ProgramError;
use apex_core::isa::parser::parse_program;

#[test]
fn movc_and_add() {
    let mut ctx = TestContext::new(
        "MOVC R1,#3\n\
         MOVC R2,#4\n\
         ADD  R3,R1,R2\n\
         HALT\n",
    );
    assert!(ctx.run().is_none());
    assert_eq!(ctx.reg(1), 3);
    assert_eq!(ctx.reg(2), 4);
    assert_eq!(ctx.reg(3), 7);
    assert_eq!(ctx.retired(), 4);
    assert!(!ctx.flags().z);
    assert!(ctx.flags().p);
}

#[test]
fn raw_chain_via_forwarding() {
    let mut ctx = TestContext::new(
        "MOVC R1,#10\n\
         ADDL R2,R1,#5\n\
         ADDL R3,R2,#1\n\
         HALT\n",
    );
    assert!(ctx.run().is_none());
    assert_eq!(ctx.reg(1), 10);
    assert_eq!(ctx.reg(2), 15);
    assert_eq!(ctx.reg(3), 16);
    // Forwarding lets the dependent chain issue back-to-back rather than
    // waiting a full retire latency between each link.
    assert!(ctx.ticks() < 40, "took {} ticks, forwarding should keep this short", ctx.ticks());
}

#[test]
fn loop_with_taken_branch_trains_the_btb() {
    let source = "MOVC R1,#0\n\
                  MOVC R2,#3\n\
                  ADDL R1,R1,#1\n\
                  CMP  R1,R2\n\
                  BNZ  #-8\n\
                  HALT\n";
    let mut ctx = TestContext::new(source);
    assert!(ctx.run().is_none());
    assert_eq!(ctx.reg(1), 3);
    assert_eq!(ctx.reg(2), 3);
    assert!(ctx.flags().z);

    let code = parse_program(source).unwrap();
    let reference = run_sequentially(&code, 4096).unwrap();
    assert_eq!(ctx.retired(), reference.retired);
}

#[test]
fn load_store_round_trip() {
    let mut ctx = TestContext::new(
        "MOVC R1,#42\n\
         MOVC R2,#5\n\
         STORE R1,R2,#0\n\
         LOAD  R3,R2,#0\n\
         HALT\n",
    );
    assert!(ctx.run().is_none());
    assert_eq!(ctx.reg(3), 42);
    assert_eq!(ctx.mem(5), 42);
}

#[test]
fn loadp_post_increments_the_base_register() {
    let mut ctx = TestContext::new(
        "MOVC R1,#100\n\
         MOVC R2,#7\n\
         STORE R2,R1,#0\n\
         LOADP R3,R1,#0\n\
         HALT\n",
    );
    assert!(ctx.run().is_none());
    assert_eq!(ctx.reg(3), 7);
    assert_eq!(ctx.reg(1), 104);
}

#[test]
fn not_taken_branch_does_not_retire_the_wrong_path() {
    // CMP R1,R1 always sets Z, so BNZ never takes: the fall-through MOVC
    // must be the one that retires, regardless of the BTB's initial
    // (weakly-taken) prediction for BNZ.
    let mut ctx = TestContext::new(
        "MOVC R1,#0\n\
         CMP  R1,R1\n\
         BNZ  #8\n\
         MOVC R2,#99\n\
         HALT\n",
    );
    assert!(ctx.run().is_none());
    assert_eq!(ctx.reg(2), 99);
    assert_eq!(ctx.retired(), 5);
}

#[test]
fn divide_by_zero_ends_the_run_with_a_program_error() {
    let mut ctx = TestContext::new(
        "MOVC R1,#5\n\
         MOVC R2,#0\n\
         DIV  R3,R1,R2\n\
         HALT\n",
    );
    let err = ctx.run();
    assert_eq!(err, Some(ProgramError::DivideByZero { pc: 4008 }));
}

#[test]
fn out_of_bounds_store_ends_the_run_with_a_program_error() {
    let mut ctx = TestContext::new(
        "MOVC R1,#1\n\
         MOVC R2,#1000000\n\
         STORE R1,R2,#0\n\
         HALT\n",
    );
    let err = ctx.run();
    assert_eq!(err, Some(ProgramError::MemoryOutOfBounds { addr: 1_000_000 }));
}

#[test]
fn running_the_same_program_twice_is_deterministic() {
    let source = "MOVC R1,#0\n\
                  MOVC R2,#3\n\
                  ADDL R1,R1,#1\n\
                  CMP  R1,R2\n\
                  BNZ  #-8\n\
                  HALT\n";
    let mut a = TestContext::new(source);
    let mut b = TestContext::new(source);
    assert!(a.run().is_none());
    assert!(b.run().is_none());
    assert_eq!(a.reg(1), b.reg(1));
    assert_eq!(a.reg(2), b.reg(2));
    assert_eq!(a.retired(), b.retired());
}
