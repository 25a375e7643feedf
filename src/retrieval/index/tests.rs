use super::*;

fn index_of(vectors: &[Vec<f32>]) -> SimilarityIndex {
    SimilarityIndex::build(vectors).expect("build should succeed")
}

#[test]
fn build_empty() {
    let index = index_of(&[]);

    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert_eq!(index.dimension(), 0);
}

#[test]
fn build_fixes_dimension_from_first_vector() {
    let index = index_of(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);

    assert_eq!(index.len(), 2);
    assert_eq!(index.dimension(), 3);
}

#[test]
fn build_rejects_mismatched_dimension() {
    let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0, 1.0]];

    let err = SimilarityIndex::build(&vectors).expect_err("build should fail");

    let IndexError::DimensionMismatch {
        expected,
        found,
        position,
    } = err;
    assert_eq!(expected, 2);
    assert_eq!(found, 3);
    assert_eq!(position, 2);
}

#[test]
fn search_empty_index_returns_no_results() {
    let index = index_of(&[]);

    let results = index.search(&[1.0, 2.0], 3).expect("search should succeed");

    assert!(results.is_empty());
}

#[test]
fn search_rejects_mismatched_query_dimension() {
    let index = index_of(&[vec![1.0, 0.0]]);

    let err = index.search(&[1.0, 0.0, 0.0], 1).expect_err("should fail");

    assert!(matches!(
        err,
        IndexError::DimensionMismatch {
            expected: 2,
            found: 3,
            ..
        }
    ));
}

#[test]
fn search_orders_by_ascending_distance() {
    let index = index_of(&[
        vec![10.0, 0.0],
        vec![1.0, 0.0],
        vec![5.0, 0.0],
        vec![2.0, 0.0],
    ]);

    let results = index.search(&[0.0, 0.0], 4).expect("search should succeed");

    let ids: Vec<u32> = results.iter().map(|n| n.id.as_u32()).collect();
    assert_eq!(ids, vec![1, 3, 2, 0]);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn search_returns_min_of_k_and_len() {
    let index = index_of(&[vec![1.0], vec![2.0], vec![3.0]]);

    assert_eq!(index.search(&[0.0], 2).expect("search").len(), 2);
    // k larger than the stored set returns everything, ordered.
    assert_eq!(index.search(&[0.0], 10).expect("search").len(), 3);
    assert_eq!(index.search(&[0.0], 0).expect("search").len(), 0);
}

#[test]
fn ties_break_by_lowest_chunk_id() {
    // Two stored vectors equidistant from the query.
    let index = index_of(&[vec![1.0, 0.0], vec![-1.0, 0.0], vec![1.0, 0.0]]);

    let results = index.search(&[0.0, 0.0], 3).expect("search should succeed");

    let ids: Vec<u32> = results.iter().map(|n| n.id.as_u32()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn distances_are_euclidean() {
    let index = index_of(&[vec![3.0, 4.0]]);

    let results = index.search(&[0.0, 0.0], 1).expect("search should succeed");

    assert_eq!(results.len(), 1);
    assert!((results[0].distance - 5.0).abs() < 1e-6);
}

#[test]
fn nearest_vector_is_returned_first() {
    let index = index_of(&[vec![0.9, 0.1], vec![0.1, 0.9]]);

    let results = index.search(&[1.0, 0.0], 1).expect("search should succeed");

    assert_eq!(results[0].id, ChunkId::new(0));
}
