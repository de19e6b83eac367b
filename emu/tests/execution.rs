use rpnarch::{OpTable, Symbol};
use rpnasm::{assemble, Config};
use rpnemu::{CpuHost, KernelHost, Launch, Machine};
use rpnkgen::{generate, KernelParams};

fn table() -> OpTable {
    let symbols = [
        Symbol::constant("CUDART_PI_F", "3.141592654f"),
        Symbol::unary("sqrtf"),
        Symbol::binary("powf", true),
    ];
    OpTable::with_symbols(&symbols).unwrap()
}

/// Run `code` on `input` and compare the scaled output and final stack.
fn exec(code: &str, input: f32, output: f32, stack: &[f32]) {
    let table = table();
    let program = assemble("t.rpn", code, &table, Config::default()).unwrap();
    println!("code: {:?}", program.code);
    println!("data: {:?}", program.data);

    let outcome = Machine::new(&table, &program.code, &program.data)
        .max_steps(Some(10_000))
        .run(input)
        .unwrap();
    println!("{:?}", outcome);

    assert_eq!(outcome.status, 0);
    assert!(
        (outcome.output - output).abs() < 1e-3,
        "{} != {}",
        outcome.output,
        output
    );
    assert_eq!(outcome.stack.len(), stack.len());
    for (got, want) in outcome.stack.iter().zip(stack) {
        assert!((got - want).abs() < 1e-5, "{got} != {want}");
    }
}

macro_rules! case {
    ($name:ident, $code:expr, $input:expr => $output:expr, $stack:expr) => {
        #[test]
        fn $name() {
            exec($code, $input, $output, &$stack);
        }
    };
}

case!(
    add_immediates,
    ".data\n2.0 3.0\n.code\npush #0\npush #1\nadd\nret\n",
    0.0 => 1275.0,
    [0.0, 5.0]
);

// A is popped first: 0.4 - 1.0.
case!(
    sub_pop_order,
    ".data\n1.0 0.4\n.code\npush #0\npush #1\nsub\nquit\n",
    102.0 => -153.0,
    [0.4, -0.6]
);

case!(
    invert_by_sub,
    ".data\nzero: 0.0\none: 1.0\n.code\npush one\nsub\n",
    102.0 => 153.0,
    [0.6]
);

case!(invert_op, ".data\n.code\ninvert\n", 51.0 => 204.0, [0.8]);

case!(
    identity_through_subroutine,
    "\
.data
one: 1.0
.code
        call twice
        quit
twice:  call flip
flip:   push one
        sub
        ret
",
    51.0 => 51.0,
    [0.2]
);

case!(
    jump_over,
    "\
.data
.code
        jmp skip
        invert
skip:   noop
",
    102.0 => 102.0,
    [0.4]
);

case!(
    constants_and_functions,
    "\
.data
two: 2.0
.code
        pop
        push two
        CUDART_PI_F
        pow
        sqrtf
",
    0.0 => 3.141593 * 255.0,
    [3.141593]
);

#[test]
fn generated_kernel_runs_on_cpu_host() {
    let table = table();
    let params = KernelParams {
        pixel_width: 4,
        ..KernelParams::default()
    };
    let program = assemble(
        "t.rpn",
        ".data\nhalf: 0.5\n.code\npush half\nmul\n",
        &table,
        Config::default(),
    )
    .unwrap();
    let source = generate(&table, &params);
    let input: Vec<f32> = (0..16).map(|v| (v * 16) as f32).collect();

    let mut host = CpuHost::new(&table, params).block_size(3);
    let out = host.launch(&Launch::new(&source, &program, &input, 4)).unwrap();
    assert_eq!(out.len(), input.len());
    for (got, x) in out.iter().zip(&input) {
        assert!((got - x * 0.5).abs() < 1e-3);
    }
    assert_eq!(host.live_buffers(), 0);
}
