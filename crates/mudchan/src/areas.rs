use serde::Deserialize;

use crate::error::WorldError;
use crate::world::{Room, World};

#[derive(Clone, Debug)]
pub struct AreaSummary {
    pub zone_id: String,
    pub zone_name: String,
    pub start_room: Option<String>,
    pub room_count: usize,
}

#[derive(Debug, Deserialize)]
struct AreaFile {
    #[allow(dead_code)]
    version: u32,
    zone_id: String,
    zone_name: Option<String>,
    start_room: Option<String>,
    rooms: Vec<AreaRoom>,
}

#[derive(Debug, Deserialize)]
struct AreaRoom {
    id: String,
    name: String,
    #[serde(default)]
    listener: bool,
}

impl World {
    /// Loads one area file (YAML room graph) into the world.
    ///
    /// Rooms already present under the same id are replaced but keep their occupants. A file
    /// that fails validation leaves the world untouched.
    pub fn load_area_yaml(&mut self, fname: &str, s: &str) -> Result<AreaSummary, WorldError> {
        let a = serde_yaml::from_str::<AreaFile>(s).map_err(|e| area_err(fname, e))?;
        check_area_file(fname, &a)?;
        Ok(self.apply_area_file(a))
    }

    /// Loads a multi-document YAML stream (`---` separated), one area per document.
    ///
    /// Every document is parsed and checked before any of them is applied.
    pub fn load_areas_yaml(
        &mut self,
        fname: &str,
        s: &str,
    ) -> Result<Vec<AreaSummary>, WorldError> {
        let mut files = Vec::new();
        for (i, doc) in serde_yaml::Deserializer::from_str(s).enumerate() {
            let name = format!("{fname}#{i}");
            let a = AreaFile::deserialize(doc).map_err(|e| area_err(&name, e))?;
            check_area_file(&name, &a)?;
            files.push(a);
        }

        let mut out = files
            .into_iter()
            .map(|a| self.apply_area_file(a))
            .collect::<Vec<_>>();
        out.sort_by(|a, b| a.zone_id.cmp(&b.zone_id));
        Ok(out)
    }

    fn apply_area_file(&mut self, a: AreaFile) -> AreaSummary {
        let zone_id = a.zone_id.trim().to_string();
        let zone_name = a.zone_name.clone().unwrap_or_else(|| zone_id.clone());
        self.add_area(zone_id.clone(), zone_name.clone());

        let room_count = a.rooms.len();
        for r in a.rooms {
            let id = r.id.trim().to_string();
            if id.is_empty() {
                continue;
            }
            self.add_room(
                Room::new(id, r.name)
                    .in_area(zone_id.clone())
                    .listening(r.listener),
            );
        }

        AreaSummary {
            zone_id,
            zone_name,
            start_room: a.start_room,
            room_count,
        }
    }
}

fn area_err(fname: &str, msg: impl std::fmt::Display) -> WorldError {
    WorldError::AreaFile {
        file: fname.to_string(),
        msg: msg.to_string(),
    }
}

fn check_area_file(fname: &str, a: &AreaFile) -> Result<(), WorldError> {
    if a.zone_id.trim().is_empty() {
        return Err(area_err(fname, "empty zone_id"));
    }
    if let Some(sr) = a.start_room.as_deref() {
        if !a.rooms.iter().any(|r| r.id.trim() == sr.trim()) {
            return Err(area_err(fname, format!("start_room {sr} not in area")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOWN: &str = r#"
version: 1
zone_id: town
zone_name: Millbrook
start_room: town.square
rooms:
  - id: town.square
    name: Town Square
  - id: town.tavern
    name: The Sloppy Tankard
    listener: true
"#;

    #[test]
    fn loads_rooms_into_area() {
        let mut w = World::new();
        let sum = w.load_area_yaml("town.yaml", TOWN).unwrap();
        assert_eq!(sum.zone_name, "Millbrook");
        assert_eq!(sum.room_count, 2);
        assert_eq!(
            w.area("town").unwrap().rooms,
            vec!["town.square".to_string(), "town.tavern".to_string()]
        );
        assert!(w.room("town.tavern").unwrap().listener);
        assert!(!w.room("town.square").unwrap().listener);
    }

    #[test]
    fn multi_document_stream() {
        let mut w = World::new();
        let s = format!(
            "{TOWN}\n---\nversion: 1\nzone_id: sewers\nrooms:\n  - id: sewers.grate\n    name: Grate\n"
        );
        let sums = w.load_areas_yaml("world.yaml", &s).unwrap();
        assert_eq!(
            sums.iter().map(|a| a.zone_id.as_str()).collect::<Vec<_>>(),
            vec!["sewers", "town"]
        );
        assert_eq!(w.room_ids().len(), 3);
    }

    #[test]
    fn bad_files_carry_context() {
        let mut w = World::new();
        let err = w.load_area_yaml("broken.yaml", "zone_id: [").unwrap_err();
        assert!(err.to_string().starts_with("area yaml broken.yaml:"));

        let err = w
            .load_area_yaml(
                "lost.yaml",
                "version: 1\nzone_id: lost\nstart_room: lost.nowhere\nrooms: []\n",
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "area yaml lost.yaml: start_room lost.nowhere not in area"
        );
    }

    #[test]
    fn failed_loads_leave_world_untouched() {
        let mut w = World::new();
        w.add_room(Room::new("elsewhere.r", "Elsewhere").in_area("elsewhere"));

        let err = w
            .load_area_yaml(
                "bad.yaml",
                "version: 1\nzone_id: bad\nstart_room: elsewhere.r\nrooms:\n  - id: bad.r\n    name: R\n",
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "area yaml bad.yaml: start_room elsewhere.r not in area"
        );
        assert_eq!(w.room_ids(), vec!["elsewhere.r"]);
        assert_eq!(w.area_ids(), vec!["elsewhere"]);

        // Second document is broken, so the first one is not applied either.
        let s = format!("{TOWN}\n---\nversion: 1\nzone_id: \"  \"\nrooms: []\n");
        let err = w.load_areas_yaml("world.yaml", &s).unwrap_err();
        assert_eq!(err.to_string(), "area yaml world.yaml#1: empty zone_id");
        assert_eq!(w.room_ids(), vec!["elsewhere.r"]);
        assert!(w.area("town").is_none());
    }
}
