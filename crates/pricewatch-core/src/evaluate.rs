//! Threshold evaluation: the pure step between extraction and notification.

use rust_decimal::Decimal;

use crate::products::{MatchResult, NormalizedProduct};

/// Keeps products priced at or below `threshold`, cheapest first.
///
/// The sort is stable, so products with equal prices stay in source order.
pub fn evaluate<I>(products: I, threshold: Decimal) -> MatchResult
where
    I: IntoIterator<Item = NormalizedProduct>,
{
    let mut matches: Vec<NormalizedProduct> = products
        .into_iter()
        .filter(|p| p.price <= threshold)
        .collect();
    matches.sort_by(|a, b| a.price.cmp(&b.price));
    MatchResult::from_sorted(matches)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn product(name: &str, price: i64) -> NormalizedProduct {
        NormalizedProduct {
            id: None,
            name: name.to_string(),
            price: Decimal::from(price),
            original_price: None,
            rating: None,
            review_count: None,
            link: "https://www.wildberries.ru".to_string(),
        }
    }

    fn names(result: &MatchResult) -> Vec<&str> {
        result.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn keeps_products_at_or_below_threshold() {
        let result = evaluate(
            vec![product("a", 100), product("b", 50), product("c", 101)],
            Decimal::from(100),
        );
        assert_eq!(names(&result), vec!["b", "a"]);
    }

    #[test]
    fn empty_when_nothing_qualifies() {
        let result = evaluate(vec![product("a", 500)], Decimal::from(100));
        assert!(result.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = evaluate(Vec::new(), Decimal::from(100));
        assert!(result.is_empty());
    }

    #[test]
    fn ties_keep_source_order() {
        let result = evaluate(
            vec![
                product("first", 10),
                product("cheap", 5),
                product("second", 10),
                product("third", 10),
            ],
            Decimal::from(10),
        );
        assert_eq!(names(&result), vec!["cheap", "first", "second", "third"]);
    }

    #[test]
    fn fractional_threshold_is_respected() {
        let mut p = product("a", 0);
        p.price = Decimal::new(99_995, 2);
        let result = evaluate(vec![p], Decimal::new(99_990, 2));
        assert!(result.is_empty());
    }

    #[test]
    fn randomized_sets_are_sound_complete_and_ordered() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let len = rng.random_range(0..30);
            let products: Vec<NormalizedProduct> = (0..len)
                .map(|i| product(&i.to_string(), rng.random_range(0..50)))
                .collect();
            let threshold = Decimal::from(rng.random_range(0..50));

            let result = evaluate(products.clone(), threshold);

            // soundness
            assert!(result.iter().all(|p| p.price <= threshold));
            // completeness
            let expected = products.iter().filter(|p| p.price <= threshold).count();
            assert_eq!(result.len(), expected);
            // ascending, ties in source order (names are source indices)
            for pair in result.into_vec().windows(2) {
                assert!(pair[0].price <= pair[1].price);
                if pair[0].price == pair[1].price {
                    let a: usize = pair[0].name.parse().unwrap();
                    let b: usize = pair[1].name.parse().unwrap();
                    assert!(a < b);
                }
            }
        }
    }
}
