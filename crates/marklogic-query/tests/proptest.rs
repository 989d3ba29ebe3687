//! Property-based tests for the query builder using proptest.

use marklogic_query::{
    and, args, bucket, collection, directory, document, extract, facet, near, or, property,
    range, slice, term, value, where_, word, Arg, BuiltQuery, FragmentScope, Query, WhereClause,
};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

const OPERATORS: [&str; 6] = ["<", "<=", ">", ">=", "=", "!="];

// Every ordering of three trailing arguments.
const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

fn terms(texts: &[String]) -> Vec<Query> {
    texts
        .iter()
        .map(|t| term(args![t.as_str()]).unwrap())
        .collect()
}

fn spread(texts: &[String]) -> Vec<Arg> {
    texts.iter().map(Arg::from).collect()
}

fn text_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..6)
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// A list argument builds the same query as the spread arguments.
    #[test]
    fn sole_list_is_spread(texts in text_strategy()) {
        let queries = terms(&texts);
        let spread: Vec<Arg> = queries.iter().cloned().map(Arg::from).collect();

        prop_assert_eq!(and(args![queries.clone()]).unwrap(), and(spread.clone()).unwrap());
        prop_assert_eq!(or(args![queries]).unwrap(), or(spread).unwrap());
    }

    /// The same law holds for leaf queries, document sets, and facets.
    #[test]
    fn sole_list_is_spread_everywhere(texts in text_strategy()) {
        let queries = terms(&texts);
        let query_args: Vec<Arg> = queries.iter().cloned().map(Arg::from).collect();
        prop_assert_eq!(near(args![queries]).unwrap(), near(query_args).unwrap());

        prop_assert_eq!(term(args![texts.clone()]).unwrap(), term(spread(&texts)).unwrap());
        prop_assert_eq!(
            collection(args![texts.clone()]).unwrap(),
            collection(spread(&texts)).unwrap()
        );
        prop_assert_eq!(
            directory(args![texts.clone()]).unwrap(),
            directory(spread(&texts)).unwrap()
        );
        prop_assert_eq!(
            document(args![texts.clone()]).unwrap(),
            document(spread(&texts)).unwrap()
        );

        let mut indexed = vec![Arg::from("title")];
        indexed.extend(spread(&texts));
        prop_assert_eq!(word(args![indexed.clone()]).unwrap(), word(indexed.clone()).unwrap());
        prop_assert_eq!(value(args![indexed.clone()]).unwrap(), value(indexed).unwrap());

        let mut bucketed = vec![Arg::from("price")];
        for (i, text) in texts.iter().enumerate() {
            bucketed.push(Arg::from(bucket(args![text.as_str(), "<", i]).unwrap()));
        }
        prop_assert_eq!(facet(args![bucketed.clone()]).unwrap(), facet(bucketed).unwrap());

        let paths: Vec<String> = texts.iter().map(|t| format!("/{t}")).collect();
        prop_assert_eq!(extract(args![paths.clone()]).ok(), extract(spread(&paths)).ok());
    }

    /// The range slots are claimed by shape, not position.
    #[test]
    fn range_arguments_are_order_independent(
        op in prop::sample::select(OPERATORS.to_vec()),
        value in any::<i32>(),
        perm in prop::sample::select(PERMUTATIONS.to_vec()),
    ) {
        let trailing = [Arg::from("xs:int"), Arg::from(op), Arg::from(value)];
        let mut shuffled = vec![Arg::from(property("rating"))];
        shuffled.extend(perm.iter().map(|&i| trailing[i].clone()));

        let canonical = range(args![property("rating"), "xs:int", op, value]).unwrap();
        prop_assert_eq!(range(shuffled).unwrap(), canonical);
    }

    /// Editing a copy leaves the original untouched.
    #[test]
    fn copy_shares_nothing(texts in text_strategy()) {
        let original = where_(args![terms(&texts)]).unwrap();
        let mut copy = BuiltQuery::copy_from(&original);
        prop_assert_eq!(&copy, &original);

        if let Some(WhereClause::Structured(w)) = copy.where_clause_mut() {
            w.fragment_scope = Some(FragmentScope::Properties);
            if let Some(list) = w.query.as_mut() {
                list.queries.clear();
            }
        }
        prop_assert_ne!(&copy, &original);
        prop_assert_eq!(original, where_(args![terms(&texts)]).unwrap());
    }

    /// A serialized query reads back as an equal query.
    #[test]
    fn serialized_query_reads_back(
        texts in text_strategy(),
        name in "[a-z]{1,8}",
        start in 1u64..1000,
        length in 1u64..100,
    ) {
        let mut queries = terms(&texts);
        queries.push(word(args![name.as_str(), "moby"]).unwrap());
        let original = where_(args![queries])
            .unwrap()
            .slice(args![start, length])
            .unwrap();

        let text = original.to_json_string().unwrap();
        prop_assert_eq!(BuiltQuery::copy_from_str(&text).unwrap(), original);
    }

    /// Page length is always the second number when one is given.
    #[test]
    fn slice_length_is_kept(start in 0u64..1000, length in 0u64..100) {
        let q = slice(args![start, length]).unwrap();
        let clause = q.slice_clause().unwrap();
        prop_assert_eq!(clause.page_length, Some(length));
        if length == 0 {
            prop_assert_eq!(clause.page_start, None);
        } else {
            prop_assert_eq!(clause.page_start, Some(start));
        }
    }
}
