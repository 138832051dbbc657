use matrix_mul::{Error, Matrix, ROOT, multiply, multiply_sequential};
use mesh::{Communicator, MeshConfig, launch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Output of one rank: its C and how many messages it sent.
type RankOutput = Result<(Matrix, u64), Error>;

async fn run(config: &MeshConfig, a: &Matrix, b: &Matrix) -> Vec<RankOutput> {
    let (m, n, p) = (a.rows(), a.cols(), b.cols());
    let inputs = (a.clone(), b.clone());
    launch(config, move |comm| {
        let (mut a, mut b) = if comm.rank() == ROOT {
            inputs.clone()
        } else {
            (Matrix::new(m, n), Matrix::new(n, p))
        };
        async move {
            let mut c = Matrix::new(m, p);
            multiply(&mut a, &mut b, &mut c, &comm).await?;
            Ok::<_, Error>((c, comm.messages_sent()))
        }
    })
    .await
    .unwrap()
}

async fn root_product(world_size: usize, a: &Matrix, b: &Matrix) -> Matrix {
    let config = MeshConfig::default().with_world_size(world_size);
    let mut outputs = run(&config, a, b).await;
    for (rank, output) in outputs.iter().enumerate() {
        assert!(output.is_ok(), "rank {} failed: {:?}", rank, output);
    }
    outputs.swap_remove(ROOT).unwrap().0
}

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    let mut m = Matrix::new(rows, cols);
    for value in m.raw_buffer_mut() {
        *value = rng.gen_range(-10.0..10.0);
    }
    m
}

fn by_definition(a: &Matrix, b: &Matrix) -> Matrix {
    let mut c = Matrix::new(a.rows(), b.cols());
    for i in 0..a.rows() {
        for j in 0..b.cols() {
            let mut sum = 0.0;
            for k in 0..a.cols() {
                sum += a.get(i, k) * b.get(k, j);
            }
            c.set(i, j, sum);
        }
    }
    c
}

#[tokio::test]
async fn test_identity_on_two_ranks() {
    let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
    let b = Matrix::identity(2);

    let c = root_product(2, &a, &b).await;
    assert_eq!(c, a);
}

#[tokio::test]
async fn test_ones_on_various_worlds() {
    let a = Matrix::filled(4, 3, 1.0);
    let b = Matrix::filled(3, 2, 1.0);

    for world_size in [1, 2, 4] {
        let c = root_product(world_size, &a, &b).await;
        assert_eq!(c, Matrix::filled(4, 2, 3.0), "world_size={}", world_size);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_random_products_match_definition() {
    let mut rng = StdRng::seed_from_u64(7);
    let shapes = [(1, 1, 1), (3, 2, 4), (7, 5, 3), (10, 4, 6), (2, 3, 2), (0, 3, 2)];

    for (m, n, p) in shapes {
        let a = random_matrix(&mut rng, m, n);
        let b = random_matrix(&mut rng, n, p);
        let expected = by_definition(&a, &b);

        for world_size in 1..=5 {
            let c = root_product(world_size, &a, &b).await;
            assert_eq!(c, expected, "shape={:?} world_size={}", (m, n, p), world_size);
        }
    }
}

#[tokio::test]
async fn test_single_rank_matches_many_ranks() {
    let mut rng = StdRng::seed_from_u64(99);
    let a = random_matrix(&mut rng, 9, 4);
    let b = random_matrix(&mut rng, 4, 5);

    let single = root_product(1, &a, &b).await;
    for world_size in [2, 3, 4, 9] {
        assert_eq!(root_product(world_size, &a, &b).await, single);
    }
    assert_eq!(single, multiply_sequential(&a, &b).unwrap());
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_matrix(&mut rng, 6, 3);
    let b = random_matrix(&mut rng, 3, 4);

    let first = root_product(3, &a, &b).await;
    let second = root_product(3, &a, &b).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_single_rank_sends_nothing() {
    let a = Matrix::filled(3, 3, 2.0);
    let b = Matrix::identity(3);

    let outputs = run(&MeshConfig::default(), &a, &b).await;
    let (c, sent) = outputs.into_iter().next().unwrap().unwrap();
    assert_eq!(c, a);
    assert_eq!(sent, 0);
}

#[tokio::test]
async fn test_more_ranks_than_rows() {
    let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = Matrix::from_rows(vec![vec![1.0, 1.0], vec![0.0, 1.0]]).unwrap();
    let config = MeshConfig::default().with_world_size(5);

    let outputs = run(&config, &a, &b).await;
    let outputs: Vec<_> = outputs.into_iter().map(Result::unwrap).collect();

    assert_eq!(
        outputs[ROOT].0.to_rows(),
        vec![vec![1.0, 3.0], vec![3.0, 7.0]]
    );
    // Ranks without rows only acknowledge the broadcast.
    for (c, sent) in &outputs[1..] {
        assert_eq!(*sent, 1);
        assert_eq!(c, &Matrix::new(2, 2));
    }
}

#[tokio::test]
async fn test_inner_dimension_mismatch_fails_before_communication() {
    let a = Matrix::filled(2, 3, 1.0);
    let b = Matrix::filled(4, 2, 1.0);
    let config = MeshConfig::default().with_world_size(3);

    let outputs = launch(&config, move |comm| {
        let (mut a, mut b) = (a.clone(), b.clone());
        async move {
            let mut c = Matrix::new(2, 2);
            let result = multiply(&mut a, &mut b, &mut c, &comm).await;
            (result, comm.messages_sent())
        }
    })
    .await
    .unwrap();

    for (result, sent) in outputs {
        assert!(matches!(result, Err(Error::DimensionMismatch(2, 3, 4, 2))));
        assert_eq!(sent, 0);
    }
}

#[tokio::test]
async fn test_wrong_output_shape_is_rejected() {
    let config = MeshConfig::default().with_world_size(2);

    let outputs = launch(&config, |comm| async move {
        let mut a = Matrix::new(3, 2);
        let mut b = Matrix::new(2, 2);
        let mut c = Matrix::new(2, 3);
        let result = multiply(&mut a, &mut b, &mut c, &comm).await;
        (result, comm.messages_sent())
    })
    .await
    .unwrap();

    for (result, sent) in outputs {
        assert!(matches!(result, Err(Error::OutputShape { .. })));
        assert_eq!(sent, 0);
    }
}

#[tokio::test]
async fn test_missing_rank_aborts_root() {
    let config = MeshConfig::default().with_world_size(3);

    let outputs = launch(&config, |comm| async move {
        if comm.rank() == 2 {
            drop(comm);
            return Ok(());
        }
        let mut a = Matrix::filled(6, 2, 1.0);
        let mut b = Matrix::filled(2, 2, 1.0);
        let mut c = Matrix::new(6, 2);
        multiply(&mut a, &mut b, &mut c, &comm).await
    })
    .await
    .unwrap();

    assert!(matches!(
        outputs[ROOT],
        Err(Error::Mesh(mesh::Error::ChannelClosed { peer: 2 }))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_minimal_channel_capacity() {
    let mut rng = StdRng::seed_from_u64(21);
    let a = random_matrix(&mut rng, 11, 6);
    let b = random_matrix(&mut rng, 6, 7);
    let config = MeshConfig::default()
        .with_world_size(4)
        .with_channel_capacity(1);

    let outputs = run(&config, &a, &b).await;
    let (c, _) = outputs.into_iter().next().unwrap().unwrap();
    assert_eq!(c, by_definition(&a, &b));
}
