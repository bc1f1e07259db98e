mod proptest_helpers;

use mytardis::model::{ResourceKind, ResultSet};
use proptest::prelude::*;
use proptest_helpers::{arb_pagination, proptest_config, FakeServer, QUERY_URL};

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn len_is_total_count_without_fetching((total, limit, offset) in arb_pagination()) {
        let server = FakeServer::new(total);
        let set = ResultSet::new(&server, ResourceKind::Dataset, QUERY_URL, server.page(limit, offset))
            .expect("result set");
        prop_assert_eq!(set.len(), total);
        prop_assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn iteration_matches_indexing((total, limit, offset) in arb_pagination()) {
        let server = FakeServer::new(total);
        let set = ResultSet::new(&server, ResourceKind::Dataset, QUERY_URL, server.page(limit, offset))
            .expect("result set");

        let iterated: Vec<i64> = set
            .iter()
            .map(|record| record.expect("record").id())
            .collect();
        prop_assert_eq!(iterated.len(), total);
        for (index, id) in iterated.iter().enumerate() {
            prop_assert_eq!(*id, index as i64);
            prop_assert_eq!(set.get(index).expect("indexed").id(), *id);
        }
    }

    #[test]
    fn requested_pages_stay_on_the_first_page_grid((total, limit, offset) in arb_pagination()) {
        let server = FakeServer::new(total);
        let set = ResultSet::new(&server, ResourceKind::Dataset, QUERY_URL, server.page(limit, offset))
            .expect("result set");
        for record in &set {
            record.expect("record");
        }

        for url in server.requests.borrow().iter() {
            let requested = url
                .rsplit_once("offset=")
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .expect("offset parameter");
            let aligned = requested == 0 || (requested as i64 - offset as i64) % limit as i64 == 0;
            prop_assert!(aligned, "offset {} is off the grid of {} + k*{}", requested, offset, limit);
            let expected_limit = format!("limit={limit}");
            prop_assert!(url.contains(&expected_limit));
        }
    }

    #[test]
    fn out_of_range_is_an_error((total, limit, offset) in arb_pagination(), extra in 0usize..10) {
        let server = FakeServer::new(total);
        let set = ResultSet::new(&server, ResourceKind::Dataset, QUERY_URL, server.page(limit, offset))
            .expect("result set");
        prop_assert!(set.get(total + extra).is_err());
        prop_assert_eq!(server.request_count(), 0);
    }
}
