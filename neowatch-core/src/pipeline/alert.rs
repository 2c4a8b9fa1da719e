use crate::orbit::JulianDate;

/// Text delivered to the alert topic when a collision is found.
pub fn format_collision_alert(
    name: &str,
    impact_time: JulianDate,
    miss_distance_km: f64,
) -> String {
    format!(
        "CRITICAL ALERT: IMPACT DETECTED\n\n\
         Asteroid: {name}\n\
         Impact Date (Julian): {impact_time:.2}\n\
         Miss Distance: {miss_distance_km:.2} km\n\n\
         Check dashboard immediately."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_name_date_and_distance() {
        let text = format_collision_alert("99942 Apophis", 2_462_240.4071, 3_125.456);
        assert_eq!(
            text,
            "CRITICAL ALERT: IMPACT DETECTED\n\n\
             Asteroid: 99942 Apophis\n\
             Impact Date (Julian): 2462240.41\n\
             Miss Distance: 3125.46 km\n\n\
             Check dashboard immediately."
        );
    }
}
