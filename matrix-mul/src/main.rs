use std::env;
use std::process;

use matrix_mul::config::{RunConfig, split_program};
use matrix_mul::{Matrix, ROOT, multiply, multiply_sequential};
use mesh::{Communicator, launch};

const PRINT_LIMIT: usize = 8;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let (program, args) = split_program(env::args());
    let config = match RunConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: {} [ranks] [m] [n] [p] [mode] [seed]", program);
            eprintln!("Modes:");
            eprintln!("  random    - seeded uniform values (default)");
            eprintln!("  ones      - all elements 1");
            eprintln!("  identity  - A counts up, B is the identity (n == p)");
            eprintln!("  sequence  - A and B count up row by row");
            process::exit(2);
        }
    };

    let (a, b) = config.inputs();
    let (m, n, p) = (config.m, config.n, config.p);
    println!(
        "Multiplying {}x{} by {}x{} on {} ranks ({:?} inputs)",
        m, n, n, p, config.mesh.world_size, config.mode
    );
    if m <= PRINT_LIMIT && n <= PRINT_LIMIT && p <= PRINT_LIMIT {
        println!("Matrix A:\n{}", a);
        println!("Matrix B:\n{}", b);
    }

    let inputs = (a.clone(), b.clone());
    let results = launch(&config.mesh, move |comm| {
        let (mut a, mut b) = if comm.rank() == ROOT {
            inputs.clone()
        } else {
            (Matrix::new(m, n), Matrix::new(n, p))
        };
        async move {
            let mut c = Matrix::new(m, p);
            multiply(&mut a, &mut b, &mut c, &comm).await?;
            Ok::<_, matrix_mul::Error>(c)
        }
    })
    .await?;

    let mut c = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(matrix) if rank == ROOT => c = Some(matrix),
            Ok(_) => {}
            Err(e) => {
                eprintln!("Rank {} failed: {}", rank, e);
                process::exit(1);
            }
        }
    }
    let c = c.ok_or("root produced no result")?;

    let expected = multiply_sequential(&a, &b)?;
    if c != expected {
        eprintln!("Distributed result differs from the sequential product");
        process::exit(1);
    }

    if m <= PRINT_LIMIT && p <= PRINT_LIMIT {
        println!("Result ({}x{}):\n{}", m, p, c);
    }
    println!("Verified {}x{} result against the sequential product", m, p);

    Ok(())
}
