//! Fixed liturgical content of the Anglican rosary

pub const APOSTLES_CREED_STANZAS: [&str; 7] = [
    "I believe in God, the Father Almighty, the maker of heaven and earth:",
    "and in Jesus Christ his only Son our Lord: who was conceived by the Holy Ghost, born of the Virgin Mary:",
    "suffered under Pontius Pilate, was crucified, dead, and buried:",
    "he descended into hell; the third day he rose again from the dead:",
    "he ascended into heaven, and sitteth on the right hand of God the Father Almighty: from thence he shall come to judge the quick and the dead.",
    "I believe in the Holy Ghost: the holy catholic church; the communion of saints:",
    "the forgiveness of sins: the resurrection of the body, and the life everlasting. Amen.",
];

/// Versicles and responses, one per line
pub const INVITATORY_GLORIA: &str = "V. O God, make speed to save us.\n\
R. O Lord, make haste to help us.\n\
V. Glory be to the Father, and to the Son, and to the Holy Ghost;\n\
R. As it was in the beginning, is now, and ever shall be, world without end. Amen.";

pub const LORDS_PRAYER_STANZAS: [&str; 5] = [
    "Our Father which art in heaven, hallowed be thy name.",
    "Thy kingdom come, thy will be done in earth, as it is in heaven.",
    "Give us this day our daily bread.",
    "And forgive us our trespasses, as we forgive them that trespass against us.",
    "And lead us not into temptation, but deliver us from evil: for thine is the kingdom, and the power, and the glory, for ever and ever. Amen.",
];

pub const INVOCATION: &str =
    "O God the Son, Redeemer of the world: have mercy upon us miserable sinners.";

/// One entry per mystery set
pub const MYSTERIES: [&str; 4] = [
    "By the mystery of thy holy incarnation;",
    "By thy holy nativity and circumcision;",
    "By thy baptism, fasting, and temptation;",
    "By thine agony and bloody sweat;",
];

/// Invocations said after each mystery
pub const INVOCATIONS_PER_SET: usize = 7;
