//! Curated capability catalogs for well-known servers.
//!
//! A catalog applies when the server's display name contains its needle,
//! case-insensitively. Entries are marked inferred.

use toolrelay_core::CapabilityDescriptor;

struct Catalog {
    needle: &'static str,
    tools: &'static [(&'static str, &'static str)],
}

const CATALOGS: &[Catalog] = &[Catalog {
    needle: "airbnb",
    tools: &[
        (
            "airbnb_search",
            "Search listings by location, dates and number of guests",
        ),
        (
            "airbnb_listing_details",
            "Get full details for a specific listing",
        ),
        (
            "airbnb_check_availability",
            "Check whether a listing is free for given dates",
        ),
        ("airbnb_get_pricing", "Get the nightly price and fees for a stay"),
        ("airbnb_get_reviews", "Read guest reviews for a listing"),
        ("airbnb_host_info", "Get information about a listing's host"),
        ("airbnb_amenities", "List the amenities offered by a listing"),
        ("airbnb_nearby", "Find points of interest near a listing"),
        (
            "airbnb_compare_listings",
            "Compare several listings side by side",
        ),
        ("airbnb_booking_link", "Build a booking link for a listing"),
    ],
}];

pub(super) fn curated_for(server_name: &str) -> Vec<CapabilityDescriptor> {
    let folded = server_name.to_lowercase();
    CATALOGS
        .iter()
        .filter(|catalog| folded.contains(catalog.needle))
        .flat_map(|catalog| catalog.tools)
        .map(|(name, description)| CapabilityDescriptor::inferred(*name, *description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airbnb_catalog_matches_case_insensitively() {
        let tools = curated_for("My AirBnB Server");
        assert_eq!(tools.len(), 10);
        assert!(tools.iter().all(|t| t.inferred));
        assert_eq!(tools[0].name, "airbnb_search");
    }

    #[test]
    fn test_unknown_server_has_no_catalog() {
        assert!(curated_for("Weather").is_empty());
    }
}
