//! Element orders of each API version
//!
//! The server validates child order against its schema, so every complex
//! element the client sends is listed here under its wire element name.

use crate::version::ApiVersion;
use dfpsoap::{EntityOrder, FieldOrderTable, REQUEST_HEADER};
use once_cell::sync::Lazy;

/// Response fields that are always lists, even with a single item.
pub const COLLECTION_FIELDS: &[&str] = &[
    "results",
    "errors",
    "sizes",
    "creativeSizes",
    "creativePlaceholders",
    "frequencyCaps",
    "targetedAdUnitIds",
    "excludedAdUnitIds",
    "targetedPlacementIds",
    "appliedLabels",
    "customCreativeAssets",
    "columns",
    "dimensions",
    "rows",
    "columnTypes",
    "values",
];

const DATE: &[&str] = &["year", "month", "day"];
const DATE_TIME: &[&str] = &["date", "hour", "minute", "second", "timeZoneID"];
const SIZE: &[&str] = &["width", "height", "isAspectRatio"];
const MONEY: &[&str] = &["currencyCode", "microAmount"];
const CREATIVE_BASE: &[&str] = &["advertiserId", "id", "name", "size", "previewUrl"];

fn order(fields: &[&str]) -> EntityOrder {
    EntityOrder::new(fields.iter().copied())
}

fn creative_subtype(extra: &[&str]) -> Vec<String> {
    CREATIVE_BASE
        .iter()
        .chain(extra)
        .map(|f| f.to_string())
        .collect()
}

fn creative_order() -> EntityOrder {
    order(CREATIVE_BASE)
        .with_subtype(
            "ImageCreative",
            creative_subtype(&["destinationUrl", "imageName", "imageByteArray", "overrideSize", "imageUrl"]),
        )
        .with_subtype(
            "FlashCreative",
            creative_subtype(&[
                "destinationUrl",
                "flashName",
                "flashByteArray",
                "fallbackImageName",
                "fallbackImageByteArray",
                "overrideSize",
            ]),
        )
        .with_subtype(
            "ImageRedirectCreative",
            creative_subtype(&["destinationUrl", "imageUrl"]),
        )
        .with_subtype(
            "FlashRedirectCreative",
            creative_subtype(&["destinationUrl", "flashUrl", "fallbackUrl", "fallbackPreviewUrl"]),
        )
        .with_subtype(
            "ThirdPartyCreative",
            creative_subtype(&["snippet", "expandedSnippet"]),
        )
        .with_subtype(
            "CustomCreative",
            creative_subtype(&["destinationUrl", "htmlSnippet", "customCreativeAssets"]),
        )
}

fn bind_value_order() -> EntityOrder {
    // Date and DateTime payloads share the `value` element; their fields
    // are disjoint so one list serves both.
    order(&[
        "year", "month", "day", "date", "hour", "minute", "second", "timeZoneID",
    ])
    .with_subtype("TextValue", ["value"])
    .with_subtype("NumberValue", ["value"])
    .with_subtype("BooleanValue", ["value"])
    .with_subtype("DateValue", ["value"])
    .with_subtype("DateTimeValue", ["value"])
}

fn custom_targeting_value_order() -> EntityOrder {
    order(&["customTargetingKeyId", "id", "name", "displayName", "matchType"])
}

fn v201004() -> FieldOrderTable {
    FieldOrderTable::new()
        .entity(
            REQUEST_HEADER,
            order(&["authToken", "oAuthToken", "networkCode", "applicationName"]),
        )
        .entities(&["filterStatement", "selectStatement"], order(&["query", "values"]))
        .entity("values", order(&["key", "value"]))
        .entity("value", bind_value_order())
        .leaf("value", "value")
        .entities(&["date", "startDate", "endDate"], order(DATE))
        .entities(
            &["startDateTime", "endDateTime", "lastModifiedDateTime"],
            order(DATE_TIME),
        )
        .entities(&["size", "sizes", "creativeSizes"], order(SIZE))
        .entities(&["totalBudget", "costPerUnit", "valueCostPerUnit", "budget"], order(MONEY))
        .entities(
            &["adUnit", "adUnits"],
            order(&[
                "id",
                "name",
                "parentId",
                "description",
                "targetWindow",
                "status",
                "sizes",
            ]),
        )
        .entities(
            &["company", "companies"],
            order(&["id", "name", "type", "address", "email", "faxPhone", "primaryPhone", "externalId", "comment", "creditStatus"]),
        )
        .entities(&["creative", "creatives"], creative_order())
        .entities(
            &["order", "orders"],
            order(&[
                "id",
                "name",
                "startDateTime",
                "endDateTime",
                "status",
                "isArchived",
                "notes",
                "externalOrderId",
                "poNumber",
                "currencyCode",
                "advertiserId",
                "agencyId",
                "creatorId",
                "traffickerId",
                "salespersonId",
                "totalImpressionsDelivered",
                "totalClicksDelivered",
                "totalBudget",
                "lastModifiedDateTime",
            ]),
        )
        .entities(
            &["lineItem", "lineItems"],
            order(&[
                "orderId",
                "id",
                "name",
                "orderName",
                "startDateTime",
                "endDateTime",
                "unlimitedEndDateTime",
                "creativeRotationType",
                "deliveryRateType",
                "roadblockingType",
                "frequencyCaps",
                "lineItemType",
                "unitType",
                "duration",
                "unitsBought",
                "costPerUnit",
                "valueCostPerUnit",
                "costType",
                "discountType",
                "discount",
                "creativeSizes",
                "allowOverbook",
                "status",
                "reservationStatus",
                "isArchived",
                "targeting",
            ]),
        )
        .entity("frequencyCaps", order(&["maxImpressions", "numTimeUnits", "timeUnit"]))
        .entity(
            "targeting",
            order(&[
                "inventoryTargeting",
                "geoTargeting",
                "dayPartTargeting",
                "userDomainTargeting",
                "technologyTargeting",
                "customTargeting",
            ]),
        )
        .entity(
            "inventoryTargeting",
            order(&["targetedAdUnitIds", "excludedAdUnitIds", "targetedPlacementIds"]),
        )
        .entities(
            &["lineItemCreativeAssociation", "lineItemCreativeAssociations"],
            order(&[
                "lineItemId",
                "creativeId",
                "manualCreativeRotationWeight",
                "destinationUrl",
                "startDateTime",
                "endDateTime",
                "status",
            ]),
        )
        .entity(
            "network",
            order(&[
                "id",
                "displayName",
                "networkCode",
                "propertyCode",
                "timeZone",
                "currencyCode",
                "effectiveRootAdUnitId",
            ]),
        )
        .entities(
            &["placement", "placements"],
            order(&[
                "id",
                "name",
                "description",
                "placementCode",
                "status",
                "isAdSenseTargetingEnabled",
                "adSenseTargetingLocale",
                "targetedAdUnitIds",
            ]),
        )
        .entities(
            &["user", "users"],
            order(&["id", "name", "email", "roleId", "roleName", "preferredLocale"]),
        )
}

fn v201010() -> FieldOrderTable {
    v201004()
        .entity("reportJob", order(&["id", "reportQuery", "reportJobStatus"]))
        .entity(
            "reportQuery",
            order(&["dimensions", "columns", "dateRangeType", "startDate", "endDate"]),
        )
}

fn v201101() -> FieldOrderTable {
    v201010()
        .entities(
            &["adUnit", "adUnits"],
            order(&[
                "id",
                "name",
                "parentId",
                "description",
                "targetWindow",
                "status",
                "adUnitCode",
                "sizes",
                "explicitlyTargeted",
            ]),
        )
        .entities(
            &["label", "labels"],
            order(&["id", "name", "description", "isActive", "types"]),
        )
        .entity("appliedLabels", order(&["labelId", "isNegated"]))
        .entities(
            &["keys", "customTargetingKeys"],
            order(&["id", "name", "displayName", "type"]),
        )
        .entity("customTargetingValues", custom_targeting_value_order())
        // `values` is the statement bind list everywhere else.
        .scoped(
            "createCustomTargetingValues",
            "values",
            custom_targeting_value_order(),
        )
        .entity(
            "customTargeting",
            order(&["logicalOperator", "children"]),
        )
}

fn v201103() -> FieldOrderTable {
    v201101().entities(
        &["order", "orders"],
        order(&[
            "id",
            "name",
            "startDateTime",
            "endDateTime",
            "status",
            "isArchived",
            "notes",
            "externalOrderId",
            "poNumber",
            "currencyCode",
            "advertiserId",
            "agencyId",
            "creatorId",
            "traffickerId",
            "salespersonId",
            "totalImpressionsDelivered",
            "totalClicksDelivered",
            "totalBudget",
            "appliedLabels",
            "lastModifiedDateTime",
        ]),
    )
}

static V201004: Lazy<FieldOrderTable> = Lazy::new(v201004);
static V201010: Lazy<FieldOrderTable> = Lazy::new(v201010);
static V201101: Lazy<FieldOrderTable> = Lazy::new(v201101);
static V201103: Lazy<FieldOrderTable> = Lazy::new(v201103);

/// Field orders of a version.
pub fn field_order_table(version: ApiVersion) -> &'static FieldOrderTable {
    match version {
        ApiVersion::V201004 => &V201004,
        ApiVersion::V201010 => &V201010,
        ApiVersion::V201101 => &V201101,
        ApiVersion::V201103 => &V201103,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(order: Option<&[String]>) -> Vec<&str> {
        order.unwrap().iter().map(String::as_str).collect()
    }

    #[test]
    fn ad_unit_order() {
        let table = field_order_table(ApiVersion::V201010);
        let ad_unit = fields(table.order_for("adUnit", None));
        let name = ad_unit.iter().position(|f| *f == "name").unwrap();
        let parent = ad_unit.iter().position(|f| *f == "parentId").unwrap();
        let sizes = ad_unit.iter().position(|f| *f == "sizes").unwrap();
        assert!(name < parent && parent < sizes);
        assert!(!ad_unit.contains(&"adUnitCode"));

        let newer = fields(field_order_table(ApiVersion::V201103).order_for("adUnit", None));
        assert!(newer.contains(&"adUnitCode"));
    }

    #[test]
    fn creative_subtypes() {
        let table = field_order_table(ApiVersion::V201004);
        let image = fields(table.order_for("creative", Some("ImageCreative")));
        assert_eq!(&image[..5], CREATIVE_BASE);
        assert_eq!(image[5], "destinationUrl");
        assert!(table.order_for("creative", Some("VideoCreative")).is_none());
    }

    #[test]
    fn report_entities_appear_in_v201010() {
        assert!(field_order_table(ApiVersion::V201004).get("reportJob").is_none());
        assert!(field_order_table(ApiVersion::V201010).get("reportJob").is_some());
    }

    #[test]
    fn custom_targeting_values_keep_their_order() {
        let table = field_order_table(ApiVersion::V201103);
        let created = fields(table.order_in(Some("createCustomTargetingValues"), "values", None));
        assert_eq!(created[0], "customTargetingKeyId");
        assert_eq!(fields(table.order_in(Some("filterStatement"), "values", None)), ["key", "value"]);
        assert_eq!(
            fields(field_order_table(ApiVersion::V201010).order_in(
                Some("createCustomTargetingValues"),
                "values",
                None
            )),
            ["key", "value"]
        );
    }

    #[test]
    fn request_header_order() {
        let table = field_order_table(ApiVersion::V201103);
        assert_eq!(
            fields(table.order_for(REQUEST_HEADER, None)),
            ["authToken", "oAuthToken", "networkCode", "applicationName"]
        );
    }
}
