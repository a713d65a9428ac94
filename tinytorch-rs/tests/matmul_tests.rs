use nalgebra::Matrix2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tinytorch::Tensor;

const TOLERANCE: f32 = 1e-10;

// Integer-valued entries keep every product and sum exact in f32, so both
// code paths must agree bit for bit.
fn random_2x2(rng: &mut StdRng) -> Tensor {
    let values: Vec<f32> = (0..4).map(|_| rng.gen_range(-100i32..=100) as f32).collect();
    Tensor::from_shape_vec(&[2, 2], values).unwrap()
}

fn reference_product(a: &Tensor, b: &Tensor) -> Vec<f32> {
    let a = Matrix2::from_row_slice(&a.to_vec());
    let b = Matrix2::from_row_slice(&b.to_vec());
    let c = a * b;
    vec![c[(0, 0)], c[(0, 1)], c[(1, 0)], c[(1, 1)]]
}

#[test]
fn test_2x2_path_matches_general_path() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let a = random_2x2(&mut rng);
        let b = random_2x2(&mut rng);

        let special = a.matmul_2x2(&b).unwrap();
        let general = a.matmul_batched(&b).unwrap();
        assert!(special.allclose(&general, TOLERANCE));
        assert_eq!(special.to_vec(), reference_product(&a, &b));

        assert_eq!(a.matmul(&b).unwrap(), special);
    }
}

#[test]
fn test_2x2_known_product() {
    let a = Tensor::new([[1, 2], [3, 4]]).unwrap();
    let b = Tensor::new([[5, 6], [7, 8]]).unwrap();
    let c = a.matmul(&b).unwrap();
    assert_eq!(c.shape(), &[2, 2]);
    assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
}

#[test]
fn test_inner_dimension_mismatch() {
    let a = Tensor::new([[1, 2], [3, 4]]).unwrap();

    let err = a.matmul(&Tensor::new([1, 2, 3]).unwrap()).unwrap_err();
    assert!(err.is_shape());
    assert!(err.to_string().contains("2 ≠ 3"), "{}", err);

    let err = a.matmul(&Tensor::zeros(&[3, 2])).unwrap_err();
    assert!(err.to_string().contains("2 ≠ 3"), "{}", err);
}

#[test]
fn test_batched_against_per_matrix_products() {
    let mut rng = StdRng::seed_from_u64(11);
    let values: Vec<f32> = (0..12).map(|_| rng.gen_range(-9i32..=9) as f32).collect();
    let stack = Tensor::from_shape_vec(&[3, 2, 2], values).unwrap();
    let rhs = random_2x2(&mut rng);

    let out = stack.matmul(&rhs).unwrap();
    assert_eq!(out.shape(), &[3, 2, 2]);
    for i in 0..3 {
        let expected = stack.get(i).unwrap().matmul_2x2(&rhs).unwrap();
        assert_eq!(out.get(i).unwrap(), expected);
    }
}

#[test]
fn test_matmul_does_not_touch_operands() {
    let a = Tensor::new([[1, 2], [3, 4]]).unwrap();
    let b = a.transpose();
    let (a0, b0) = (a.clone(), b.clone());
    let _ = a.matmul(&b).unwrap();
    assert_eq!(a, a0);
    assert_eq!(b, b0);
}
