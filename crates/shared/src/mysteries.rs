//! Static rosary catalogue: four mystery sets of five meditations each.

use serde::Serialize;

use crate::domain::{MeditationId, MysteryCategory};

pub const MEDITATIONS_PER_SET: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meditation {
    pub id: MeditationId,
    pub title: &'static str,
    pub description: &'static str,
    pub scripture: Option<&'static str>,
    pub artwork: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MysterySet {
    pub category: MysteryCategory,
    pub meditations: [Meditation; MEDITATIONS_PER_SET],
}

impl MysterySet {
    pub fn meditation(&self, ordinal: u8) -> Option<&Meditation> {
        self.meditations.get(usize::from(ordinal))
    }

    /// The meditation that follows `id` in this set, `None` after the fifth.
    pub fn next_after(&self, id: MeditationId) -> Option<&Meditation> {
        if id.category != self.category {
            return None;
        }
        self.meditation(id.ordinal.checked_add(1)?)
    }
}

pub fn mystery_set(category: MysteryCategory) -> &'static MysterySet {
    match category {
        MysteryCategory::Joyful => &JOYFUL,
        MysteryCategory::Sorrowful => &SORROWFUL,
        MysteryCategory::Glorious => &GLORIOUS,
        MysteryCategory::Luminous => &LUMINOUS,
    }
}

pub fn meditation(id: MeditationId) -> Option<&'static Meditation> {
    mystery_set(id.category).meditation(id.ordinal)
}

const fn entry(
    category: MysteryCategory,
    ordinal: u8,
    title: &'static str,
    description: &'static str,
    scripture: Option<&'static str>,
    artwork: &'static str,
) -> Meditation {
    Meditation {
        id: MeditationId { category, ordinal },
        title,
        description,
        scripture,
        artwork: Some(artwork),
    }
}

static JOYFUL: MysterySet = MysterySet {
    category: MysteryCategory::Joyful,
    meditations: [
        entry(
            MysteryCategory::Joyful,
            0,
            "The Annunciation",
            "The angel Gabriel announces to Mary that she will conceive the Son of God.",
            Some("Luke 1:26-38"),
            "artwork/joyful/annunciation.jpg",
        ),
        entry(
            MysteryCategory::Joyful,
            1,
            "The Visitation",
            "Mary visits her cousin Elizabeth, who greets her as the mother of the Lord.",
            Some("Luke 1:39-56"),
            "artwork/joyful/visitation.jpg",
        ),
        entry(
            MysteryCategory::Joyful,
            2,
            "The Nativity",
            "Jesus is born in a stable in Bethlehem and laid in a manger.",
            Some("Luke 2:1-20"),
            "artwork/joyful/nativity.jpg",
        ),
        entry(
            MysteryCategory::Joyful,
            3,
            "The Presentation in the Temple",
            "Mary and Joseph present the infant Jesus in the Temple, where Simeon recognizes him.",
            Some("Luke 2:22-38"),
            "artwork/joyful/presentation.jpg",
        ),
        entry(
            MysteryCategory::Joyful,
            4,
            "The Finding in the Temple",
            "After three days of searching, Mary and Joseph find Jesus teaching in the Temple.",
            Some("Luke 2:41-52"),
            "artwork/joyful/finding.jpg",
        ),
    ],
};

static SORROWFUL: MysterySet = MysterySet {
    category: MysteryCategory::Sorrowful,
    meditations: [
        entry(
            MysteryCategory::Sorrowful,
            0,
            "The Agony in the Garden",
            "Jesus prays in Gethsemane and accepts the will of the Father.",
            Some("Matthew 26:36-46"),
            "artwork/sorrowful/agony.jpg",
        ),
        entry(
            MysteryCategory::Sorrowful,
            1,
            "The Scourging at the Pillar",
            "Jesus is bound and scourged at the order of Pilate.",
            Some("John 19:1"),
            "artwork/sorrowful/scourging.jpg",
        ),
        entry(
            MysteryCategory::Sorrowful,
            2,
            "The Crowning with Thorns",
            "The soldiers mock Jesus and press a crown of thorns upon his head.",
            Some("Matthew 27:27-31"),
            "artwork/sorrowful/crowning.jpg",
        ),
        entry(
            MysteryCategory::Sorrowful,
            3,
            "The Carrying of the Cross",
            "Jesus carries his cross along the road to Calvary.",
            Some("John 19:17"),
            "artwork/sorrowful/carrying.jpg",
        ),
        entry(
            MysteryCategory::Sorrowful,
            4,
            "The Crucifixion",
            "Jesus is nailed to the cross and dies for the salvation of the world.",
            Some("Luke 23:33-46"),
            "artwork/sorrowful/crucifixion.jpg",
        ),
    ],
};

static GLORIOUS: MysterySet = MysterySet {
    category: MysteryCategory::Glorious,
    meditations: [
        entry(
            MysteryCategory::Glorious,
            0,
            "The Resurrection",
            "On the third day Jesus rises from the dead.",
            Some("Matthew 28:1-10"),
            "artwork/glorious/resurrection.jpg",
        ),
        entry(
            MysteryCategory::Glorious,
            1,
            "The Ascension",
            "Forty days after Easter, Jesus ascends into heaven.",
            Some("Acts 1:6-11"),
            "artwork/glorious/ascension.jpg",
        ),
        entry(
            MysteryCategory::Glorious,
            2,
            "The Descent of the Holy Spirit",
            "The Holy Spirit descends upon Mary and the apostles at Pentecost.",
            Some("Acts 2:1-4"),
            "artwork/glorious/pentecost.jpg",
        ),
        entry(
            MysteryCategory::Glorious,
            3,
            "The Assumption",
            "At the end of her earthly life, Mary is taken body and soul into heaven.",
            None,
            "artwork/glorious/assumption.jpg",
        ),
        entry(
            MysteryCategory::Glorious,
            4,
            "The Coronation of Mary",
            "Mary is crowned Queen of Heaven and Earth.",
            Some("Revelation 12:1"),
            "artwork/glorious/coronation.jpg",
        ),
    ],
};

static LUMINOUS: MysterySet = MysterySet {
    category: MysteryCategory::Luminous,
    meditations: [
        entry(
            MysteryCategory::Luminous,
            0,
            "The Baptism of Jesus",
            "Jesus is baptized in the Jordan and the Father's voice declares him the beloved Son.",
            Some("Matthew 3:13-17"),
            "artwork/luminous/baptism.jpg",
        ),
        entry(
            MysteryCategory::Luminous,
            1,
            "The Wedding at Cana",
            "At Mary's request, Jesus turns water into wine.",
            Some("John 2:1-11"),
            "artwork/luminous/cana.jpg",
        ),
        entry(
            MysteryCategory::Luminous,
            2,
            "The Proclamation of the Kingdom",
            "Jesus proclaims the Kingdom of God and calls all to conversion.",
            Some("Mark 1:14-15"),
            "artwork/luminous/proclamation.jpg",
        ),
        entry(
            MysteryCategory::Luminous,
            3,
            "The Transfiguration",
            "On the mountain, Jesus is transfigured before Peter, James and John.",
            Some("Matthew 17:1-8"),
            "artwork/luminous/transfiguration.jpg",
        ),
        entry(
            MysteryCategory::Luminous,
            4,
            "The Institution of the Eucharist",
            "At the Last Supper, Jesus gives his body and blood under the signs of bread and wine.",
            Some("Matthew 26:26-28"),
            "artwork/luminous/eucharist.jpg",
        ),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_set_has_five_ordered_meditations() {
        for category in MysteryCategory::ALL {
            let set = mystery_set(category);
            assert_eq!(set.category, category);
            for (ordinal, meditation) in set.meditations.iter().enumerate() {
                assert_eq!(meditation.id.category, category);
                assert_eq!(usize::from(meditation.id.ordinal), ordinal);
                assert!(!meditation.title.is_empty());
                assert!(!meditation.description.is_empty());
            }
        }
    }

    #[test]
    fn next_after_walks_the_set_and_stops_after_fifth() {
        let set = mystery_set(MysteryCategory::Sorrowful);
        let mut current = &set.meditations[0];
        let mut visited = vec![current.title];
        while let Some(next) = set.next_after(current.id) {
            current = next;
            visited.push(current.title);
        }
        assert_eq!(visited.len(), MEDITATIONS_PER_SET);
        assert_eq!(visited.last(), Some(&"The Crucifixion"));
    }

    #[test]
    fn next_after_rejects_foreign_category() {
        let set = mystery_set(MysteryCategory::Joyful);
        let foreign = MeditationId::new(MysteryCategory::Luminous, 0);
        assert!(set.next_after(foreign).is_none());
    }

    #[test]
    fn lookup_by_id_rejects_out_of_range_ordinal() {
        assert!(meditation(MeditationId::new(MysteryCategory::Glorious, 4)).is_some());
        assert!(meditation(MeditationId::new(MysteryCategory::Glorious, 5)).is_none());
    }
}
