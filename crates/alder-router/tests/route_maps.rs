//! Route map compilation and matching.

use alder_router::{
    Matcher, MatcherEntry, Params, Query, RouteMapBuilder, RouteOptions, Router, RouterError,
};
use serde_json::json;

fn entry_paths(matcher: &Matcher) -> Vec<&str> {
    matcher.entries().iter().map(MatcherEntry::path).collect()
}

#[test]
fn test_complex_route_map_order() {
    let tree = RouteMapBuilder::build(|map| {
        map.route("application", RouteOptions::new(), |map| {
            map.route("notifications", RouteOptions::new(), |_| {});
            map.route("messages", RouteOptions::new(), |map| {
                map.route("unread", RouteOptions::new(), |map| {
                    map.route("priority", RouteOptions::new(), |_| {});
                });
                map.route("read", RouteOptions::new(), |_| {});
                map.route("draft", RouteOptions::new(), |map| {
                    map.route("recent", RouteOptions::new(), |_| {});
                });
            });
            map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
        });
        map.route("anotherTopLevel", RouteOptions::new(), |map| {
            map.route("withChildren", RouteOptions::new(), |_| {});
        });
    })
    .unwrap();

    let matcher = Matcher::compile(tree);
    assert_eq!(
        entry_paths(&matcher),
        [
            "/application",
            "/application/notifications",
            "/application/messages",
            "/application/messages/unread",
            "/application/messages/unread/priority",
            "/application/messages/read",
            "/application/messages/draft",
            "/application/messages/draft/recent",
            "/application/:user/status/:id",
            "/anotherTopLevel",
            "/anotherTopLevel/withChildren",
        ]
    );
}

#[test]
fn test_abstract_routes_are_excluded_from_the_map() {
    let tree = RouteMapBuilder::build(|map| {
        map.route("application", RouteOptions::new().abstract_route(), |map| {
            map.route("notifications", RouteOptions::new(), |_| {});
            map.route("messages", RouteOptions::new(), |map| {
                map.route("unread", RouteOptions::new(), |map| {
                    map.route("priority", RouteOptions::new(), |_| {});
                });
                map.route("read", RouteOptions::new(), |_| {});
                map.route("draft", RouteOptions::new().abstract_route(), |map| {
                    map.route("recent", RouteOptions::new(), |_| {});
                });
            });
            map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
        });
        map.route("anotherTopLevel", RouteOptions::new(), |map| {
            map.route("withChildren", RouteOptions::new(), |_| {});
        });
    })
    .unwrap();

    let matcher = Matcher::compile(tree);
    assert_eq!(
        entry_paths(&matcher),
        [
            "/application/notifications",
            "/application/messages",
            "/application/messages/unread",
            "/application/messages/unread/priority",
            "/application/messages/read",
            "/application/messages/draft/recent",
            "/application/:user/status/:id",
            "/anotherTopLevel",
            "/anotherTopLevel/withChildren",
        ]
    );
}

#[test]
fn test_duplicate_route_names_fail_the_map() {
    let router = Router::new();
    let err = router
        .map(|map| {
            map.route("foo", RouteOptions::new(), |map| {
                map.route("foo", RouteOptions::new(), |_| {});
            });
        })
        .unwrap_err();
    assert_eq!(err, RouterError::DuplicateRouteName("foo".into()));
    assert_eq!(
        err.to_string(),
        "route names must be unique, but route \"foo\" is declared multiple times"
    );
}

#[test]
fn test_match_returns_route_descriptors_with_custom_data() {
    let router = Router::new();
    router
        .map(|map| {
            map.route("foo", RouteOptions::new().data(json!({ "customData": 1 })), |map| {
                map.route("bar", RouteOptions::new().data(json!({ "customData": 2 })), |_| {});
            });
        })
        .unwrap();

    let matched = router.match_path("/foo/bar");
    assert_eq!(matched.routes.len(), 2);
    assert_eq!(matched.routes[0].name, "foo");
    assert_eq!(matched.routes[0].path, "foo");
    assert_eq!(matched.routes[0].options.data, json!({ "customData": 1 }));
    assert_eq!(matched.routes[1].name, "bar");
    assert_eq!(matched.routes[1].options.data, json!({ "customData": 2 }));
}

#[test]
fn test_match_extracts_params_and_query() {
    let router = Router::new();
    router
        .map(|map| {
            map.route("application", RouteOptions::new(), |map| {
                map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
            });
        })
        .unwrap();

    let matched = router.match_path("/application/KidkArolis/status/42?withReplies=true&foo=bar");
    assert_eq!(
        matched.routes.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        ["application", "status"]
    );
    assert_eq!(matched.params.get("user").map(String::as_str), Some("KidkArolis"));
    assert_eq!(matched.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(matched.query.get("withReplies").map(String::as_str), Some("true"));
    assert_eq!(matched.query.get("foo").map(String::as_str), Some("bar"));
}

#[test]
fn test_match_ignores_the_trailing_slash() {
    let router = Router::new();
    router
        .map(|map| {
            map.route("application", RouteOptions::new(), |map| {
                map.route("messages", RouteOptions::new(), |_| {});
            });
        })
        .unwrap();

    let with = router.match_path("/application/messages");
    let without = router.match_path("/application/messages/");
    assert!(with.is_matched());
    assert_eq!(with.routes, without.routes);
}

#[test]
fn test_match_returns_empty_chain_when_nothing_matches() {
    let router = Router::new();
    router
        .map(|map| {
            map.route("application", RouteOptions::new(), |_| {});
        })
        .unwrap();

    let matched = router.match_path("/foo/bar");
    assert!(matched.routes.is_empty());
    assert!(matched.params.is_empty());
    assert_eq!(matched.pathname, "/foo/bar");
    assert!(matched.query.is_empty());

    // query parameters are parsed even when no route matches
    let matched = router.match_path("/foo/bar?hello=world");
    assert!(matched.routes.is_empty());
    assert_eq!(matched.query.get("hello").map(String::as_str), Some("world"));
}

#[test]
fn test_match_is_idempotent() {
    let router = Router::new();
    router
        .map(|map| {
            map.route("application", RouteOptions::new(), |map| {
                map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
            });
        })
        .unwrap();
    assert_eq!(
        router.match_path("/application/me/status/1?q=x"),
        router.match_path("/application/me/status/1?q=x")
    );
}

#[test]
fn test_generate_round_trip() {
    let tree = RouteMapBuilder::build(|map| {
        map.route("application", RouteOptions::new(), |map| {
            map.route("status", RouteOptions::new().path(":user/status/:id"), |_| {});
        });
    })
    .unwrap();
    let matcher = Matcher::compile(tree);

    let params: Params = [("user", "foo"), ("id", "1")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let query: Query = [("withReplies".to_string(), "true".to_string())]
        .into_iter()
        .collect();

    let url = matcher.generate("status", &params, &query).unwrap();
    let matched = matcher.match_path(&url);
    assert_eq!(matched.params, params);
    assert_eq!(matched.query, query);
}
