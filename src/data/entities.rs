/// Named character references from the WHATWG entity list, sorted by name
/// for binary search. Names keep their trailing semicolon where the spec
/// defines one; semicolon-less names are the legacy references that may be
/// used bare. Each entry decodes to one or two code points (0 = unused).
pub static NAMED_ENTITIES: &[(&str, [u32; 2])] = &[
    ("AElig", [0x00C6, 0x0000]),
    ("AElig;", [0x00C6, 0x0000]),
    ("AMP", [0x0026, 0x0000]),
    ("AMP;", [0x0026, 0x0000]),
    ("Aacute", [0x00C1, 0x0000]),
    ("Aacute;", [0x00C1, 0x0000]),
    ("Abreve;", [0x0102, 0x0000]),
    ("Acirc", [0x00C2, 0x0000]),
    ("Acirc;", [0x00C2, 0x0000]),
    ("Acy;", [0x0410, 0x0000]),
    ("Afr;", [0x1D504, 0x0000]),
    ("Agrave", [0x00C0, 0x0000]),
    ("Agrave;", [0x00C0, 0x0000]),
    ("Alpha;", [0x0391, 0x0000]),
    ("Amacr;", [0x0100, 0x0000]),
    ("And;", [0x2A53, 0x0000]),
    ("Aogon;", [0x0104, 0x0000]),
    ("Aopf;", [0x1D538, 0x0000]),
    ("ApplyFunction;", [0x2061, 0x0000]),
    ("Aring", [0x00C5, 0x0000]),
    ("Aring;", [0x00C5, 0x0000]),
    ("Ascr;", [0x1D49C, 0x0000]),
    ("Assign;", [0x2254, 0x0000]),
    ("Atilde", [0x00C3, 0x0000]),
    ("Atilde;", [0x00C3, 0x0000]),
    ("Auml", [0x00C4, 0x0000]),
    ("Auml;", [0x00C4, 0x0000]),
    ("Backslash;", [0x2216, 0x0000]),
    ("Barv;", [0x2AE7, 0x0000]),
    ("Barwed;", [0x2306, 0x0000]),
    ("Bcy;", [0x0411, 0x0000]),
    ("Because;", [0x2235, 0x0000]),
    ("Bernoullis;", [0x212C, 0x0000]),
    ("Beta;", [0x0392, 0x0000]),
    ("Bfr;", [0x1D505, 0x0000]),
    ("Bopf;", [0x1D539, 0x0000]),
    ("Breve;", [0x02D8, 0x0000]),
    ("Bscr;", [0x212C, 0x0000]),
    ("Bumpeq;", [0x224E, 0x0000]),
    ("CHcy;", [0x0427, 0x0000]),
    ("COPY", [0x00A9, 0x0000]),
    ("COPY;", [0x00A9, 0x0000]),
    ("Cacute;", [0x0106, 0x0000]),
    ("Cap;", [0x22D2, 0x0000]),
    ("CapitalDifferentialD;", [0x2145, 0x0000]),
    ("Cayleys;", [0x212D, 0x0000]),
    ("Ccaron;", [0x010C, 0x0000]),
    ("Ccedil", [0x00C7, 0x0000]),
    ("Ccedil;", [0x00C7, 0x0000]),
    ("Ccirc;", [0x0108, 0x0000]),
    ("Cconint;", [0x2230, 0x0000]),
    ("Cdot;", [0x010A, 0x0000]),
    ("Cedilla;", [0x00B8, 0x0000]),
    ("CenterDot;", [0x00B7, 0x0000]),
    ("Cfr;", [0x212D, 0x0000]),
    ("Chi;", [0x03A7, 0x0000]),
    ("CircleDot;", [0x2299, 0x0000]),
    ("CircleMinus;", [0x2296, 0x0000]),
    ("CirclePlus;", [0x2295, 0x0000]),
    ("CircleTimes;", [0x2297, 0x0000]),
    ("ClockwiseContourIntegral;", [0x2232, 0x0000]),
    ("CloseCurlyDoubleQuote;", [0x201D, 0x0000]),
    ("CloseCurlyQuote;", [0x2019, 0x0000]),
    ("Colon;", [0x2237, 0x0000]),
    ("Colone;", [0x2A74, 0x0000]),
    ("Congruent;", [0x2261, 0x0000]),
    ("Conint;", [0x222F, 0x0000]),
    ("ContourIntegral;", [0x222E, 0x0000]),
    ("Copf;", [0x2102, 0x0000]),
    ("Coproduct;", [0x2210, 0x0000]),
    ("CounterClockwiseContourIntegral;", [0x2233, 0x0000]),
    ("Cross;", [0x2A2F, 0x0000]),
    ("Cscr;", [0x1D49E, 0x0000]),
    ("Cup;", [0x22D3, 0x0000]),
    ("CupCap;", [0x224D, 0x0000]),
    ("DD;", [0x2145, 0x0000]),
    ("DDotrahd;", [0x2911, 0x0000]),
    ("DJcy;", [0x0402, 0x0000]),
    ("DScy;", [0x0405, 0x0000]),
    ("DZcy;", [0x040F, 0x0000]),
    ("Dagger;", [0x2021, 0x0000]),
    ("Darr;", [0x21A1, 0x0000]),
    ("Dashv;", [0x2AE4, 0x0000]),
    ("Dcaron;", [0x010E, 0x0000]),
    ("Dcy;", [0x0414, 0x0000]),
    ("Del;", [0x2207, 0x0000]),
    ("Delta;", [0x0394, 0x0000]),
    ("Dfr;", [0x1D507, 0x0000]),
    ("DiacriticalAcute;", [0x00B4, 0x0000]),
    ("DiacriticalDot;", [0x02D9, 0x0000]),
    ("DiacriticalDoubleAcute;", [0x02DD, 0x0000]),
    ("DiacriticalGrave;", [0x0060, 0x0000]),
    ("DiacriticalTilde;", [0x02DC, 0x0000]),
    ("Diamond;", [0x22C4, 0x0000]),
    ("DifferentialD;", [0x2146, 0x0000]),
    ("Dopf;", [0x1D53B, 0x0000]),
    ("Dot;", [0x00A8, 0x0000]),
    ("DotDot;", [0x20DC, 0x0000]),
    ("DotEqual;", [0x2250, 0x0000]),
    ("DoubleContourIntegral;", [0x222F, 0x0000]),
    ("DoubleDot;", [0x00A8, 0x0000]),
    ("DoubleDownArrow;", [0x21D3, 0x0000]),
    ("DoubleLeftArrow;", [0x21D0, 0x0000]),
    ("DoubleLeftRightArrow;", [0x21D4, 0x0000]),
    ("DoubleLeftTee;", [0x2AE4, 0x0000]),
    ("DoubleLongLeftArrow;", [0x27F8, 0x0000]),
    ("DoubleLongLeftRightArrow;", [0x27FA, 0x0000]),
    ("DoubleLongRightArrow;", [0x27F9, 0x0000]),
    ("DoubleRightArrow;", [0x21D2, 0x0000]),
    ("DoubleRightTee;", [0x22A8, 0x0000]),
    ("DoubleUpArrow;", [0x21D1, 0x0000]),
    ("DoubleUpDownArrow;", [0x21D5, 0x0000]),
    ("DoubleVerticalBar;", [0x2225, 0x0000]),
    ("DownArrow;", [0x2193, 0x0000]),
    ("DownArrowBar;", [0x2913, 0x0000]),
    ("DownArrowUpArrow;", [0x21F5, 0x0000]),
    ("DownBreve;", [0x0311, 0x0000]),
    ("DownLeftRightVector;", [0x2950, 0x0000]),
    ("DownLeftTeeVector;", [0x295E, 0x0000]),
    ("DownLeftVector;", [0x21BD, 0x0000]),
    ("DownLeftVectorBar;", [0x2956, 0x0000]),
    ("DownRightTeeVector;", [0x295F, 0x0000]),
    ("DownRightVector;", [0x21C1, 0x0000]),
    ("DownRightVectorBar;", [0x2957, 0x0000]),
    ("DownTee;", [0x22A4, 0x0000]),
    ("DownTeeArrow;", [0x21A7, 0x0000]),
    ("Downarrow;", [0x21D3, 0x0000]),
    ("Dscr;", [0x1D49F, 0x0000]),
    ("Dstrok;", [0x0110, 0x0000]),
    ("ENG;", [0x014A, 0x0000]),
    ("ETH", [0x00D0, 0x0000]),
    ("ETH;", [0x00D0, 0x0000]),
    ("Eacute", [0x00C9, 0x0000]),
    ("Eacute;", [0x00C9, 0x0000]),
    ("Ecaron;", [0x011A, 0x0000]),
    ("Ecirc", [0x00CA, 0x0000]),
    ("Ecirc;", [0x00CA, 0x0000]),
    ("Ecy;", [0x042D, 0x0000]),
    ("Edot;", [0x0116, 0x0000]),
    ("Efr;", [0x1D508, 0x0000]),
    ("Egrave", [0x00C8, 0x0000]),
    ("Egrave;", [0x00C8, 0x0000]),
    ("Element;", [0x2208, 0x0000]),
    ("Emacr;", [0x0112, 0x0000]),
    ("EmptySmallSquare;", [0x25FB, 0x0000]),
    ("EmptyVerySmallSquare;", [0x25AB, 0x0000]),
    ("Eogon;", [0x0118, 0x0000]),
    ("Eopf;", [0x1D53C, 0x0000]),
    ("Epsilon;", [0x0395, 0x0000]),
    ("Equal;", [0x2A75, 0x0000]),
    ("EqualTilde;", [0x2242, 0x0000]),
    ("Equilibrium;", [0x21CC, 0x0000]),
    ("Escr;", [0x2130, 0x0000]),
    ("Esim;", [0x2A73, 0x0000]),
    ("Eta;", [0x0397, 0x0000]),
    ("Euml", [0x00CB, 0x0000]),
    ("Euml;", [0x00CB, 0x0000]),
    ("Exists;", [0x2203, 0x0000]),
    ("ExponentialE;", [0x2147, 0x0000]),
    ("Fcy;", [0x0424, 0x0000]),
    ("Ffr;", [0x1D509, 0x0000]),
    ("FilledSmallSquare;", [0x25FC, 0x0000]),
    ("FilledVerySmallSquare;", [0x25AA, 0x0000]),
    ("Fopf;", [0x1D53D, 0x0000]),
    ("ForAll;", [0x2200, 0x0000]),
    ("Fouriertrf;", [0x2131, 0x0000]),
    ("Fscr;", [0x2131, 0x0000]),
    ("GJcy;", [0x0403, 0x0000]),
    ("GT", [0x003E, 0x0000]),
    ("GT;", [0x003E, 0x0000]),
    ("Gamma;", [0x0393, 0x0000]),
    ("Gammad;", [0x03DC, 0x0000]),
    ("Gbreve;", [0x011E, 0x0000]),
    ("Gcedil;", [0x0122, 0x0000]),
    ("Gcirc;", [0x011C, 0x0000]),
    ("Gcy;", [0x0413, 0x0000]),
    ("Gdot;", [0x0120, 0x0000]),
    ("Gfr;", [0x1D50A, 0x0000]),
    ("Gg;", [0x22D9, 0x0000]),
    ("Gopf;", [0x1D53E, 0x0000]),
    ("GreaterEqual;", [0x2265, 0x0000]),
    ("GreaterEqualLess;", [0x22DB, 0x0000]),
    ("GreaterFullEqual;", [0x2267, 0x0000]),
    ("GreaterGreater;", [0x2AA2, 0x0000]),
    ("GreaterLess;", [0x2277, 0x0000]),
    ("GreaterSlantEqual;", [0x2A7E, 0x0000]),
    ("GreaterTilde;", [0x2273, 0x0000]),
    ("Gscr;", [0x1D4A2, 0x0000]),
    ("Gt;", [0x226B, 0x0000]),
    ("HARDcy;", [0x042A, 0x0000]),
    ("Hacek;", [0x02C7, 0x0000]),
    ("Hat;", [0x005E, 0x0000]),
    ("Hcirc;", [0x0124, 0x0000]),
    ("Hfr;", [0x210C, 0x0000]),
    ("HilbertSpace;", [0x210B, 0x0000]),
    ("Hopf;", [0x210D, 0x0000]),
    ("HorizontalLine;", [0x2500, 0x0000]),
    ("Hscr;", [0x210B, 0x0000]),
    ("Hstrok;", [0x0126, 0x0000]),
    ("HumpDownHump;", [0x224E, 0x0000]),
    ("HumpEqual;", [0x224F, 0x0000]),
    ("IEcy;", [0x0415, 0x0000]),
    ("IJlig;", [0x0132, 0x0000]),
    ("IOcy;", [0x0401, 0x0000]),
    ("Iacute", [0x00CD, 0x0000]),
    ("Iacute;", [0x00CD, 0x0000]),
    ("Icirc", [0x00CE, 0x0000]),
    ("Icirc;", [0x00CE, 0x0000]),
    ("Icy;", [0x0418, 0x0000]),
    ("Idot;", [0x0130, 0x0000]),
    ("Ifr;", [0x2111, 0x0000]),
    ("Igrave", [0x00CC, 0x0000]),
    ("Igrave;", [0x00CC, 0x0000]),
    ("Im;", [0x2111, 0x0000]),
    ("Imacr;", [0x012A, 0x0000]),
    ("ImaginaryI;", [0x2148, 0x0000]),
    ("Implies;", [0x21D2, 0x0000]),
    ("Int;", [0x222C, 0x0000]),
    ("Integral;", [0x222B, 0x0000]),
    ("Intersection;", [0x22C2, 0x0000]),
    ("InvisibleComma;", [0x2063, 0x0000]),
    ("InvisibleTimes;", [0x2062, 0x0000]),
    ("Iogon;", [0x012E, 0x0000]),
    ("Iopf;", [0x1D540, 0x0000]),
    ("Iota;", [0x0399, 0x0000]),
    ("Iscr;", [0x2110, 0x0000]),
    ("Itilde;", [0x0128, 0x0000]),
    ("Iukcy;", [0x0406, 0x0000]),
    ("Iuml", [0x00CF, 0x0000]),
    ("Iuml;", [0x00CF, 0x0000]),
    ("Jcirc;", [0x0134, 0x0000]),
    ("Jcy;", [0x0419, 0x0000]),
    ("Jfr;", [0x1D50D, 0x0000]),
    ("Jopf;", [0x1D541, 0x0000]),
    ("Jscr;", [0x1D4A5, 0x0000]),
    ("Jsercy;", [0x0408, 0x0000]),
    ("Jukcy;", [0x0404, 0x0000]),
    ("KHcy;", [0x0425, 0x0000]),
    ("KJcy;", [0x040C, 0x0000]),
    ("Kappa;", [0x039A, 0x0000]),
    ("Kcedil;", [0x0136, 0x0000]),
    ("Kcy;", [0x041A, 0x0000]),
    ("Kfr;", [0x1D50E, 0x0000]),
    ("Kopf;", [0x1D542, 0x0000]),
    ("Kscr;", [0x1D4A6, 0x0000]),
    ("LJcy;", [0x0409, 0x0000]),
    ("LT", [0x003C, 0x0000]),
    ("LT;", [0x003C, 0x0000]),
    ("Lacute;", [0x0139, 0x0000]),
    ("Lambda;", [0x039B, 0x0000]),
    ("Lang;", [0x27EA, 0x0000]),
    ("Laplacetrf;", [0x2112, 0x0000]),
    ("Larr;", [0x219E, 0x0000]),
    ("Lcaron;", [0x013D, 0x0000]),
    ("Lcedil;", [0x013B, 0x0000]),
    ("Lcy;", [0x041B, 0x0000]),
    ("LeftAngleBracket;", [0x27E8, 0x0000]),
    ("LeftArrow;", [0x2190, 0x0000]),
    ("LeftArrowBar;", [0x21E4, 0x0000]),
    ("LeftArrowRightArrow;", [0x21C6, 0x0000]),
    ("LeftCeiling;", [0x2308, 0x0000]),
    ("LeftDoubleBracket;", [0x27E6, 0x0000]),
    ("LeftDownTeeVector;", [0x2961, 0x0000]),
    ("LeftDownVector;", [0x21C3, 0x0000]),
    ("LeftDownVectorBar;", [0x2959, 0x0000]),
    ("LeftFloor;", [0x230A, 0x0000]),
    ("LeftRightArrow;", [0x2194, 0x0000]),
    ("LeftRightVector;", [0x294E, 0x0000]),
    ("LeftTee;", [0x22A3, 0x0000]),
    ("LeftTeeArrow;", [0x21A4, 0x0000]),
    ("LeftTeeVector;", [0x295A, 0x0000]),
    ("LeftTriangle;", [0x22B2, 0x0000]),
    ("LeftTriangleBar;", [0x29CF, 0x0000]),
    ("LeftTriangleEqual;", [0x22B4, 0x0000]),
    ("LeftUpDownVector;", [0x2951, 0x0000]),
    ("LeftUpTeeVector;", [0x2960, 0x0000]),
    ("LeftUpVector;", [0x21BF, 0x0000]),
    ("LeftUpVectorBar;", [0x2958, 0x0000]),
    ("LeftVector;", [0x21BC, 0x0000]),
    ("LeftVectorBar;", [0x2952, 0x0000]),
    ("Leftarrow;", [0x21D0, 0x0000]),
    ("Leftrightarrow;", [0x21D4, 0x0000]),
    ("LessEqualGreater;", [0x22DA, 0x0000]),
    ("LessFullEqual;", [0x2266, 0x0000]),
    ("LessGreater;", [0x2276, 0x0000]),
    ("LessLess;", [0x2AA1, 0x0000]),
    ("LessSlantEqual;", [0x2A7D, 0x0000]),
    ("LessTilde;", [0x2272, 0x0000]),
    ("Lfr;", [0x1D50F, 0x0000]),
    ("Ll;", [0x22D8, 0x0000]),
    ("Lleftarrow;", [0x21DA, 0x0000]),
    ("Lmidot;", [0x013F, 0x0000]),
    ("LongLeftArrow;", [0x27F5, 0x0000]),
    ("LongLeftRightArrow;", [0x27F7, 0x0000]),
    ("LongRightArrow;", [0x27F6, 0x0000]),
    ("Longleftarrow;", [0x27F8, 0x0000]),
    ("Longleftrightarrow;", [0x27FA, 0x0000]),
    ("Longrightarrow;", [0x27F9, 0x0000]),
    ("Lopf;", [0x1D543, 0x0000]),
    ("LowerLeftArrow;", [0x2199, 0x0000]),
    ("LowerRightArrow;", [0x2198, 0x0000]),
    ("Lscr;", [0x2112, 0x0000]),
    ("Lsh;", [0x21B0, 0x0000]),
    ("Lstrok;", [0x0141, 0x0000]),
    ("Lt;", [0x226A, 0x0000]),
    ("Map;", [0x2905, 0x0000]),
    ("Mcy;", [0x041C, 0x0000]),
    ("MediumSpace;", [0x205F, 0x0000]),
    ("Mellintrf;", [0x2133, 0x0000]),
    ("Mfr;", [0x1D510, 0x0000]),
    ("MinusPlus;", [0x2213, 0x0000]),
    ("Mopf;", [0x1D544, 0x0000]),
    ("Mscr;", [0x2133, 0x0000]),
    ("Mu;", [0x039C, 0x0000]),
    ("NJcy;", [0x040A, 0x0000]),
    ("Nacute;", [0x0143, 0x0000]),
    ("Ncaron;", [0x0147, 0x0000]),
    ("Ncedil;", [0x0145, 0x0000]),
    ("Ncy;", [0x041D, 0x0000]),
    ("NegativeMediumSpace;", [0x200B, 0x0000]),
    ("NegativeThickSpace;", [0x200B, 0x0000]),
    ("NegativeThinSpace;", [0x200B, 0x0000]),
    ("NegativeVeryThinSpace;", [0x200B, 0x0000]),
    ("NestedGreaterGreater;", [0x226B, 0x0000]),
    ("NestedLessLess;", [0x226A, 0x0000]),
    ("NewLine;", [0x000A, 0x0000]),
    ("Nfr;", [0x1D511, 0x0000]),
    ("NoBreak;", [0x2060, 0x0000]),
    ("NonBreakingSpace;", [0x00A0, 0x0000]),
    ("Nopf;", [0x2115, 0x0000]),
    ("Not;", [0x2AEC, 0x0000]),
    ("NotCongruent;", [0x2262, 0x0000]),
    ("NotCupCap;", [0x226D, 0x0000]),
    ("NotDoubleVerticalBar;", [0x2226, 0x0000]),
    ("NotElement;", [0x2209, 0x0000]),
    ("NotEqual;", [0x2260, 0x0000]),
    ("NotEqualTilde;", [0x2242, 0x0338]),
    ("NotExists;", [0x2204, 0x0000]),
    ("NotGreater;", [0x226F, 0x0000]),
    ("NotGreaterEqual;", [0x2271, 0x0000]),
    ("NotGreaterFullEqual;", [0x2267, 0x0338]),
    ("NotGreaterGreater;", [0x226B, 0x0338]),
    ("NotGreaterLess;", [0x2279, 0x0000]),
    ("NotGreaterSlantEqual;", [0x2A7E, 0x0338]),
    ("NotGreaterTilde;", [0x2275, 0x0000]),
    ("NotHumpDownHump;", [0x224E, 0x0338]),
    ("NotHumpEqual;", [0x224F, 0x0338]),
    ("NotLeftTriangle;", [0x22EA, 0x0000]),
    ("NotLeftTriangleBar;", [0x29CF, 0x0338]),
    ("NotLeftTriangleEqual;", [0x22EC, 0x0000]),
    ("NotLess;", [0x226E, 0x0000]),
    ("NotLessEqual;", [0x2270, 0x0000]),
    ("NotLessGreater;", [0x2278, 0x0000]),
    ("NotLessLess;", [0x226A, 0x0338]),
    ("NotLessSlantEqual;", [0x2A7D, 0x0338]),
    ("NotLessTilde;", [0x2274, 0x0000]),
    ("NotNestedGreaterGreater;", [0x2AA2, 0x0338]),
    ("NotNestedLessLess;", [0x2AA1, 0x0338]),
    ("NotPrecedes;", [0x2280, 0x0000]),
    ("NotPrecedesEqual;", [0x2AAF, 0x0338]),
    ("NotPrecedesSlantEqual;", [0x22E0, 0x0000]),
    ("NotReverseElement;", [0x220C, 0x0000]),
    ("NotRightTriangle;", [0x22EB, 0x0000]),
    ("NotRightTriangleBar;", [0x29D0, 0x0338]),
    ("NotRightTriangleEqual;", [0x22ED, 0x0000]),
    ("NotSquareSubset;", [0x228F, 0x0338]),
    ("NotSquareSubsetEqual;", [0x22E2, 0x0000]),
    ("NotSquareSuperset;", [0x2290, 0x0338]),
    ("NotSquareSupersetEqual;", [0x22E3, 0x0000]),
    ("NotSubset;", [0x2282, 0x20D2]),
    ("NotSubsetEqual;", [0x2288, 0x0000]),
    ("NotSucceeds;", [0x2281, 0x0000]),
    ("NotSucceedsEqual;", [0x2AB0, 0x0338]),
    ("NotSucceedsSlantEqual;", [0x22E1, 0x0000]),
    ("NotSucceedsTilde;", [0x227F, 0x0338]),
    ("NotSuperset;", [0x2283, 0x20D2]),
    ("NotSupersetEqual;", [0x2289, 0x0000]),
    ("NotTilde;", [0x2241, 0x0000]),
    ("NotTildeEqual;", [0x2244, 0x0000]),
    ("NotTildeFullEqual;", [0x2247, 0x0000]),
    ("NotTildeTilde;", [0x2249, 0x0000]),
    ("NotVerticalBar;", [0x2224, 0x0000]),
    ("Nscr;", [0x1D4A9, 0x0000]),
    ("Ntilde", [0x00D1, 0x0000]),
    ("Ntilde;", [0x00D1, 0x0000]),
    ("Nu;", [0x039D, 0x0000]),
    ("OElig;", [0x0152, 0x0000]),
    ("Oacute", [0x00D3, 0x0000]),
    ("Oacute;", [0x00D3, 0x0000]),
    ("Ocirc", [0x00D4, 0x0000]),
    ("Ocirc;", [0x00D4, 0x0000]),
    ("Ocy;", [0x041E, 0x0000]),
    ("Odblac;", [0x0150, 0x0000]),
    ("Ofr;", [0x1D512, 0x0000]),
    ("Ograve", [0x00D2, 0x0000]),
    ("Ograve;", [0x00D2, 0x0000]),
    ("Omacr;", [0x014C, 0x0000]),
    ("Omega;", [0x03A9, 0x0000]),
    ("Omicron;", [0x039F, 0x0000]),
    ("Oopf;", [0x1D546, 0x0000]),
    ("OpenCurlyDoubleQuote;", [0x201C, 0x0000]),
    ("OpenCurlyQuote;", [0x2018, 0x0000]),
    ("Or;", [0x2A54, 0x0000]),
    ("Oscr;", [0x1D4AA, 0x0000]),
    ("Oslash", [0x00D8, 0x0000]),
    ("Oslash;", [0x00D8, 0x0000]),
    ("Otilde", [0x00D5, 0x0000]),
    ("Otilde;", [0x00D5, 0x0000]),
    ("Otimes;", [0x2A37, 0x0000]),
    ("Ouml", [0x00D6, 0x0000]),
    ("Ouml;", [0x00D6, 0x0000]),
    ("OverBar;", [0x203E, 0x0000]),
    ("OverBrace;", [0x23DE, 0x0000]),
    ("OverBracket;", [0x23B4, 0x0000]),
    ("OverParenthesis;", [0x23DC, 0x0000]),
    ("PartialD;", [0x2202, 0x0000]),
    ("Pcy;", [0x041F, 0x0000]),
    ("Pfr;", [0x1D513, 0x0000]),
    ("Phi;", [0x03A6, 0x0000]),
    ("Pi;", [0x03A0, 0x0000]),
    ("PlusMinus;", [0x00B1, 0x0000]),
    ("Poincareplane;", [0x210C, 0x0000]),
    ("Popf;", [0x2119, 0x0000]),
    ("Pr;", [0x2ABB, 0x0000]),
    ("Precedes;", [0x227A, 0x0000]),
    ("PrecedesEqual;", [0x2AAF, 0x0000]),
    ("PrecedesSlantEqual;", [0x227C, 0x0000]),
    ("PrecedesTilde;", [0x227E, 0x0000]),
    ("Prime;", [0x2033, 0x0000]),
    ("Product;", [0x220F, 0x0000]),
    ("Proportion;", [0x2237, 0x0000]),
    ("Proportional;", [0x221D, 0x0000]),
    ("Pscr;", [0x1D4AB, 0x0000]),
    ("Psi;", [0x03A8, 0x0000]),
    ("QUOT", [0x0022, 0x0000]),
    ("QUOT;", [0x0022, 0x0000]),
    ("Qfr;", [0x1D514, 0x0000]),
    ("Qopf;", [0x211A, 0x0000]),
    ("Qscr;", [0x1D4AC, 0x0000]),
    ("RBarr;", [0x2910, 0x0000]),
    ("REG", [0x00AE, 0x0000]),
    ("REG;", [0x00AE, 0x0000]),
    ("Racute;", [0x0154, 0x0000]),
    ("Rang;", [0x27EB, 0x0000]),
    ("Rarr;", [0x21A0, 0x0000]),
    ("Rarrtl;", [0x2916, 0x0000]),
    ("Rcaron;", [0x0158, 0x0000]),
    ("Rcedil;", [0x0156, 0x0000]),
    ("Rcy;", [0x0420, 0x0000]),
    ("Re;", [0x211C, 0x0000]),
    ("ReverseElement;", [0x220B, 0x0000]),
    ("ReverseEquilibrium;", [0x21CB, 0x0000]),
    ("ReverseUpEquilibrium;", [0x296F, 0x0000]),
    ("Rfr;", [0x211C, 0x0000]),
    ("Rho;", [0x03A1, 0x0000]),
    ("RightAngleBracket;", [0x27E9, 0x0000]),
    ("RightArrow;", [0x2192, 0x0000]),
    ("RightArrowBar;", [0x21E5, 0x0000]),
    ("RightArrowLeftArrow;", [0x21C4, 0x0000]),
    ("RightCeiling;", [0x2309, 0x0000]),
    ("RightDoubleBracket;", [0x27E7, 0x0000]),
    ("RightDownTeeVector;", [0x295D, 0x0000]),
    ("RightDownVector;", [0x21C2, 0x0000]),
    ("RightDownVectorBar;", [0x2955, 0x0000]),
    ("RightFloor;", [0x230B, 0x0000]),
    ("RightTee;", [0x22A2, 0x0000]),
    ("RightTeeArrow;", [0x21A6, 0x0000]),
    ("RightTeeVector;", [0x295B, 0x0000]),
    ("RightTriangle;", [0x22B3, 0x0000]),
    ("RightTriangleBar;", [0x29D0, 0x0000]),
    ("RightTriangleEqual;", [0x22B5, 0x0000]),
    ("RightUpDownVector;", [0x294F, 0x0000]),
    ("RightUpTeeVector;", [0x295C, 0x0000]),
    ("RightUpVector;", [0x21BE, 0x0000]),
    ("RightUpVectorBar;", [0x2954, 0x0000]),
    ("RightVector;", [0x21C0, 0x0000]),
    ("RightVectorBar;", [0x2953, 0x0000]),
    ("Rightarrow;", [0x21D2, 0x0000]),
    ("Ropf;", [0x211D, 0x0000]),
    ("RoundImplies;", [0x2970, 0x0000]),
    ("Rrightarrow;", [0x21DB, 0x0000]),
    ("Rscr;", [0x211B, 0x0000]),
    ("Rsh;", [0x21B1, 0x0000]),
    ("RuleDelayed;", [0x29F4, 0x0000]),
    ("SHCHcy;", [0x0429, 0x0000]),
    ("SHcy;", [0x0428, 0x0000]),
    ("SOFTcy;", [0x042C, 0x0000]),
    ("Sacute;", [0x015A, 0x0000]),
    ("Sc;", [0x2ABC, 0x0000]),
    ("Scaron;", [0x0160, 0x0000]),
    ("Scedil;", [0x015E, 0x0000]),
    ("Scirc;", [0x015C, 0x0000]),
    ("Scy;", [0x0421, 0x0000]),
    ("Sfr;", [0x1D516, 0x0000]),
    ("ShortDownArrow;", [0x2193, 0x0000]),
    ("ShortLeftArrow;", [0x2190, 0x0000]),
    ("ShortRightArrow;", [0x2192, 0x0000]),
    ("ShortUpArrow;", [0x2191, 0x0000]),
    ("Sigma;", [0x03A3, 0x0000]),
    ("SmallCircle;", [0x2218, 0x0000]),
    ("Sopf;", [0x1D54A, 0x0000]),
    ("Sqrt;", [0x221A, 0x0000]),
    ("Square;", [0x25A1, 0x0000]),
    ("SquareIntersection;", [0x2293, 0x0000]),
    ("SquareSubset;", [0x228F, 0x0000]),
    ("SquareSubsetEqual;", [0x2291, 0x0000]),
    ("SquareSuperset;", [0x2290, 0x0000]),
    ("SquareSupersetEqual;", [0x2292, 0x0000]),
    ("SquareUnion;", [0x2294, 0x0000]),
    ("Sscr;", [0x1D4AE, 0x0000]),
    ("Star;", [0x22C6, 0x0000]),
    ("Sub;", [0x22D0, 0x0000]),
    ("Subset;", [0x22D0, 0x0000]),
    ("SubsetEqual;", [0x2286, 0x0000]),
    ("Succeeds;", [0x227B, 0x0000]),
    ("SucceedsEqual;", [0x2AB0, 0x0000]),
    ("SucceedsSlantEqual;", [0x227D, 0x0000]),
    ("SucceedsTilde;", [0x227F, 0x0000]),
    ("SuchThat;", [0x220B, 0x0000]),
    ("Sum;", [0x2211, 0x0000]),
    ("Sup;", [0x22D1, 0x0000]),
    ("Superset;", [0x2283, 0x0000]),
    ("SupersetEqual;", [0x2287, 0x0000]),
    ("Supset;", [0x22D1, 0x0000]),
    ("THORN", [0x00DE, 0x0000]),
    ("THORN;", [0x00DE, 0x0000]),
    ("TRADE;", [0x2122, 0x0000]),
    ("TSHcy;", [0x040B, 0x0000]),
    ("TScy;", [0x0426, 0x0000]),
    ("Tab;", [0x0009, 0x0000]),
    ("Tau;", [0x03A4, 0x0000]),
    ("Tcaron;", [0x0164, 0x0000]),
    ("Tcedil;", [0x0162, 0x0000]),
    ("Tcy;", [0x0422, 0x0000]),
    ("Tfr;", [0x1D517, 0x0000]),
    ("Therefore;", [0x2234, 0x0000]),
    ("Theta;", [0x0398, 0x0000]),
    ("ThickSpace;", [0x205F, 0x200A]),
    ("ThinSpace;", [0x2009, 0x0000]),
    ("Tilde;", [0x223C, 0x0000]),
    ("TildeEqual;", [0x2243, 0x0000]),
    ("TildeFullEqual;", [0x2245, 0x0000]),
    ("TildeTilde;", [0x2248, 0x0000]),
    ("Topf;", [0x1D54B, 0x0000]),
    ("TripleDot;", [0x20DB, 0x0000]),
    ("Tscr;", [0x1D4AF, 0x0000]),
    ("Tstrok;", [0x0166, 0x0000]),
    ("Uacute", [0x00DA, 0x0000]),
    ("Uacute;", [0x00DA, 0x0000]),
    ("Uarr;", [0x219F, 0x0000]),
    ("Uarrocir;", [0x2949, 0x0000]),
    ("Ubrcy;", [0x040E, 0x0000]),
    ("Ubreve;", [0x016C, 0x0000]),
    ("Ucirc", [0x00DB, 0x0000]),
    ("Ucirc;", [0x00DB, 0x0000]),
    ("Ucy;", [0x0423, 0x0000]),
    ("Udblac;", [0x0170, 0x0000]),
    ("Ufr;", [0x1D518, 0x0000]),
    ("Ugrave", [0x00D9, 0x0000]),
    ("Ugrave;", [0x00D9, 0x0000]),
    ("Umacr;", [0x016A, 0x0000]),
    ("UnderBar;", [0x005F, 0x0000]),
    ("UnderBrace;", [0x23DF, 0x0000]),
    ("UnderBracket;", [0x23B5, 0x0000]),
    ("UnderParenthesis;", [0x23DD, 0x0000]),
    ("Union;", [0x22C3, 0x0000]),
    ("UnionPlus;", [0x228E, 0x0000]),
    ("Uogon;", [0x0172, 0x0000]),
    ("Uopf;", [0x1D54C, 0x0000]),
    ("UpArrow;", [0x2191, 0x0000]),
    ("UpArrowBar;", [0x2912, 0x0000]),
    ("UpArrowDownArrow;", [0x21C5, 0x0000]),
    ("UpDownArrow;", [0x2195, 0x0000]),
    ("UpEquilibrium;", [0x296E, 0x0000]),
    ("UpTee;", [0x22A5, 0x0000]),
    ("UpTeeArrow;", [0x21A5, 0x0000]),
    ("Uparrow;", [0x21D1, 0x0000]),
    ("Updownarrow;", [0x21D5, 0x0000]),
    ("UpperLeftArrow;", [0x2196, 0x0000]),
    ("UpperRightArrow;", [0x2197, 0x0000]),
    ("Upsi;", [0x03D2, 0x0000]),
    ("Upsilon;", [0x03A5, 0x0000]),
    ("Uring;", [0x016E, 0x0000]),
    ("Uscr;", [0x1D4B0, 0x0000]),
    ("Utilde;", [0x0168, 0x0000]),
    ("Uuml", [0x00DC, 0x0000]),
    ("Uuml;", [0x00DC, 0x0000]),
    ("VDash;", [0x22AB, 0x0000]),
    ("Vbar;", [0x2AEB, 0x0000]),
    ("Vcy;", [0x0412, 0x0000]),
    ("Vdash;", [0x22A9, 0x0000]),
    ("Vdashl;", [0x2AE6, 0x0000]),
    ("Vee;", [0x22C1, 0x0000]),
    ("Verbar;", [0x2016, 0x0000]),
    ("Vert;", [0x2016, 0x0000]),
    ("VerticalBar;", [0x2223, 0x0000]),
    ("VerticalLine;", [0x007C, 0x0000]),
    ("VerticalSeparator;", [0x2758, 0x0000]),
    ("VerticalTilde;", [0x2240, 0x0000]),
    ("VeryThinSpace;", [0x200A, 0x0000]),
    ("Vfr;", [0x1D519, 0x0000]),
    ("Vopf;", [0x1D54D, 0x0000]),
    ("Vscr;", [0x1D4B1, 0x0000]),
    ("Vvdash;", [0x22AA, 0x0000]),
    ("Wcirc;", [0x0174, 0x0000]),
    ("Wedge;", [0x22C0, 0x0000]),
    ("Wfr;", [0x1D51A, 0x0000]),
    ("Wopf;", [0x1D54E, 0x0000]),
    ("Wscr;", [0x1D4B2, 0x0000]),
    ("Xfr;", [0x1D51B, 0x0000]),
    ("Xi;", [0x039E, 0x0000]),
    ("Xopf;", [0x1D54F, 0x0000]),
    ("Xscr;", [0x1D4B3, 0x0000]),
    ("YAcy;", [0x042F, 0x0000]),
    ("YIcy;", [0x0407, 0x0000]),
    ("YUcy;", [0x042E, 0x0000]),
    ("Yacute", [0x00DD, 0x0000]),
    ("Yacute;", [0x00DD, 0x0000]),
    ("Ycirc;", [0x0176, 0x0000]),
    ("Ycy;", [0x042B, 0x0000]),
    ("Yfr;", [0x1D51C, 0x0000]),
    ("Yopf;", [0x1D550, 0x0000]),
    ("Yscr;", [0x1D4B4, 0x0000]),
    ("Yuml;", [0x0178, 0x0000]),
    ("ZHcy;", [0x0416, 0x0000]),
    ("Zacute;", [0x0179, 0x0000]),
    ("Zcaron;", [0x017D, 0x0000]),
    ("Zcy;", [0x0417, 0x0000]),
    ("Zdot;", [0x017B, 0x0000]),
    ("ZeroWidthSpace;", [0x200B, 0x0000]),
    ("Zeta;", [0x0396, 0x0000]),
    ("Zfr;", [0x2128, 0x0000]),
    ("Zopf;", [0x2124, 0x0000]),
    ("Zscr;", [0x1D4B5, 0x0000]),
    ("aacute", [0x00E1, 0x0000]),
    ("aacute;", [0x00E1, 0x0000]),
    ("abreve;", [0x0103, 0x0000]),
    ("ac;", [0x223E, 0x0000]),
    ("acE;", [0x223E, 0x0333]),
    ("acd;", [0x223F, 0x0000]),
    ("acirc", [0x00E2, 0x0000]),
    ("acirc;", [0x00E2, 0x0000]),
    ("acute", [0x00B4, 0x0000]),
    ("acute;", [0x00B4, 0x0000]),
    ("acy;", [0x0430, 0x0000]),
    ("aelig", [0x00E6, 0x0000]),
    ("aelig;", [0x00E6, 0x0000]),
    ("af;", [0x2061, 0x0000]),
    ("afr;", [0x1D51E, 0x0000]),
    ("agrave", [0x00E0, 0x0000]),
    ("agrave;", [0x00E0, 0x0000]),
    ("alefsym;", [0x2135, 0x0000]),
    ("aleph;", [0x2135, 0x0000]),
    ("alpha;", [0x03B1, 0x0000]),
    ("amacr;", [0x0101, 0x0000]),
    ("amalg;", [0x2A3F, 0x0000]),
    ("amp", [0x0026, 0x0000]),
    ("amp;", [0x0026, 0x0000]),
    ("and;", [0x2227, 0x0000]),
    ("andand;", [0x2A55, 0x0000]),
    ("andd;", [0x2A5C, 0x0000]),
    ("andslope;", [0x2A58, 0x0000]),
    ("andv;", [0x2A5A, 0x0000]),
    ("ang;", [0x2220, 0x0000]),
    ("ange;", [0x29A4, 0x0000]),
    ("angle;", [0x2220, 0x0000]),
    ("angmsd;", [0x2221, 0x0000]),
    ("angmsdaa;", [0x29A8, 0x0000]),
    ("angmsdab;", [0x29A9, 0x0000]),
    ("angmsdac;", [0x29AA, 0x0000]),
    ("angmsdad;", [0x29AB, 0x0000]),
    ("angmsdae;", [0x29AC, 0x0000]),
    ("angmsdaf;", [0x29AD, 0x0000]),
    ("angmsdag;", [0x29AE, 0x0000]),
    ("angmsdah;", [0x29AF, 0x0000]),
    ("angrt;", [0x221F, 0x0000]),
    ("angrtvb;", [0x22BE, 0x0000]),
    ("angrtvbd;", [0x299D, 0x0000]),
    ("angsph;", [0x2222, 0x0000]),
    ("angst;", [0x00C5, 0x0000]),
    ("angzarr;", [0x237C, 0x0000]),
    ("aogon;", [0x0105, 0x0000]),
    ("aopf;", [0x1D552, 0x0000]),
    ("ap;", [0x2248, 0x0000]),
    ("apE;", [0x2A70, 0x0000]),
    ("apacir;", [0x2A6F, 0x0000]),
    ("ape;", [0x224A, 0x0000]),
    ("apid;", [0x224B, 0x0000]),
    ("apos;", [0x0027, 0x0000]),
    ("approx;", [0x2248, 0x0000]),
    ("approxeq;", [0x224A, 0x0000]),
    ("aring", [0x00E5, 0x0000]),
    ("aring;", [0x00E5, 0x0000]),
    ("ascr;", [0x1D4B6, 0x0000]),
    ("ast;", [0x002A, 0x0000]),
    ("asymp;", [0x2248, 0x0000]),
    ("asympeq;", [0x224D, 0x0000]),
    ("atilde", [0x00E3, 0x0000]),
    ("atilde;", [0x00E3, 0x0000]),
    ("auml", [0x00E4, 0x0000]),
    ("auml;", [0x00E4, 0x0000]),
    ("awconint;", [0x2233, 0x0000]),
    ("awint;", [0x2A11, 0x0000]),
    ("bNot;", [0x2AED, 0x0000]),
    ("backcong;", [0x224C, 0x0000]),
    ("backepsilon;", [0x03F6, 0x0000]),
    ("backprime;", [0x2035, 0x0000]),
    ("backsim;", [0x223D, 0x0000]),
    ("backsimeq;", [0x22CD, 0x0000]),
    ("barvee;", [0x22BD, 0x0000]),
    ("barwed;", [0x2305, 0x0000]),
    ("barwedge;", [0x2305, 0x0000]),
    ("bbrk;", [0x23B5, 0x0000]),
    ("bbrktbrk;", [0x23B6, 0x0000]),
    ("bcong;", [0x224C, 0x0000]),
    ("bcy;", [0x0431, 0x0000]),
    ("bdquo;", [0x201E, 0x0000]),
    ("becaus;", [0x2235, 0x0000]),
    ("because;", [0x2235, 0x0000]),
    ("bemptyv;", [0x29B0, 0x0000]),
    ("bepsi;", [0x03F6, 0x0000]),
    ("bernou;", [0x212C, 0x0000]),
    ("beta;", [0x03B2, 0x0000]),
    ("beth;", [0x2136, 0x0000]),
    ("between;", [0x226C, 0x0000]),
    ("bfr;", [0x1D51F, 0x0000]),
    ("bigcap;", [0x22C2, 0x0000]),
    ("bigcirc;", [0x25EF, 0x0000]),
    ("bigcup;", [0x22C3, 0x0000]),
    ("bigodot;", [0x2A00, 0x0000]),
    ("bigoplus;", [0x2A01, 0x0000]),
    ("bigotimes;", [0x2A02, 0x0000]),
    ("bigsqcup;", [0x2A06, 0x0000]),
    ("bigstar;", [0x2605, 0x0000]),
    ("bigtriangledown;", [0x25BD, 0x0000]),
    ("bigtriangleup;", [0x25B3, 0x0000]),
    ("biguplus;", [0x2A04, 0x0000]),
    ("bigvee;", [0x22C1, 0x0000]),
    ("bigwedge;", [0x22C0, 0x0000]),
    ("bkarow;", [0x290D, 0x0000]),
    ("blacklozenge;", [0x29EB, 0x0000]),
    ("blacksquare;", [0x25AA, 0x0000]),
    ("blacktriangle;", [0x25B4, 0x0000]),
    ("blacktriangledown;", [0x25BE, 0x0000]),
    ("blacktriangleleft;", [0x25C2, 0x0000]),
    ("blacktriangleright;", [0x25B8, 0x0000]),
    ("blank;", [0x2423, 0x0000]),
    ("blk12;", [0x2592, 0x0000]),
    ("blk14;", [0x2591, 0x0000]),
    ("blk34;", [0x2593, 0x0000]),
    ("block;", [0x2588, 0x0000]),
    ("bne;", [0x003D, 0x20E5]),
    ("bnequiv;", [0x2261, 0x20E5]),
    ("bnot;", [0x2310, 0x0000]),
    ("bopf;", [0x1D553, 0x0000]),
    ("bot;", [0x22A5, 0x0000]),
    ("bottom;", [0x22A5, 0x0000]),
    ("bowtie;", [0x22C8, 0x0000]),
    ("boxDL;", [0x2557, 0x0000]),
    ("boxDR;", [0x2554, 0x0000]),
    ("boxDl;", [0x2556, 0x0000]),
    ("boxDr;", [0x2553, 0x0000]),
    ("boxH;", [0x2550, 0x0000]),
    ("boxHD;", [0x2566, 0x0000]),
    ("boxHU;", [0x2569, 0x0000]),
    ("boxHd;", [0x2564, 0x0000]),
    ("boxHu;", [0x2567, 0x0000]),
    ("boxUL;", [0x255D, 0x0000]),
    ("boxUR;", [0x255A, 0x0000]),
    ("boxUl;", [0x255C, 0x0000]),
    ("boxUr;", [0x2559, 0x0000]),
    ("boxV;", [0x2551, 0x0000]),
    ("boxVH;", [0x256C, 0x0000]),
    ("boxVL;", [0x2563, 0x0000]),
    ("boxVR;", [0x2560, 0x0000]),
    ("boxVh;", [0x256B, 0x0000]),
    ("boxVl;", [0x2562, 0x0000]),
    ("boxVr;", [0x255F, 0x0000]),
    ("boxbox;", [0x29C9, 0x0000]),
    ("boxdL;", [0x2555, 0x0000]),
    ("boxdR;", [0x2552, 0x0000]),
    ("boxdl;", [0x2510, 0x0000]),
    ("boxdr;", [0x250C, 0x0000]),
    ("boxh;", [0x2500, 0x0000]),
    ("boxhD;", [0x2565, 0x0000]),
    ("boxhU;", [0x2568, 0x0000]),
    ("boxhd;", [0x252C, 0x0000]),
    ("boxhu;", [0x2534, 0x0000]),
    ("boxminus;", [0x229F, 0x0000]),
    ("boxplus;", [0x229E, 0x0000]),
    ("boxtimes;", [0x22A0, 0x0000]),
    ("boxuL;", [0x255B, 0x0000]),
    ("boxuR;", [0x2558, 0x0000]),
    ("boxul;", [0x2518, 0x0000]),
    ("boxur;", [0x2514, 0x0000]),
    ("boxv;", [0x2502, 0x0000]),
    ("boxvH;", [0x256A, 0x0000]),
    ("boxvL;", [0x2561, 0x0000]),
    ("boxvR;", [0x255E, 0x0000]),
    ("boxvh;", [0x253C, 0x0000]),
    ("boxvl;", [0x2524, 0x0000]),
    ("boxvr;", [0x251C, 0x0000]),
    ("bprime;", [0x2035, 0x0000]),
    ("breve;", [0x02D8, 0x0000]),
    ("brvbar", [0x00A6, 0x0000]),
    ("brvbar;", [0x00A6, 0x0000]),
    ("bscr;", [0x1D4B7, 0x0000]),
    ("bsemi;", [0x204F, 0x0000]),
    ("bsim;", [0x223D, 0x0000]),
    ("bsime;", [0x22CD, 0x0000]),
    ("bsol;", [0x005C, 0x0000]),
    ("bsolb;", [0x29C5, 0x0000]),
    ("bsolhsub;", [0x27C8, 0x0000]),
    ("bull;", [0x2022, 0x0000]),
    ("bullet;", [0x2022, 0x0000]),
    ("bump;", [0x224E, 0x0000]),
    ("bumpE;", [0x2AAE, 0x0000]),
    ("bumpe;", [0x224F, 0x0000]),
    ("bumpeq;", [0x224F, 0x0000]),
    ("cacute;", [0x0107, 0x0000]),
    ("cap;", [0x2229, 0x0000]),
    ("capand;", [0x2A44, 0x0000]),
    ("capbrcup;", [0x2A49, 0x0000]),
    ("capcap;", [0x2A4B, 0x0000]),
    ("capcup;", [0x2A47, 0x0000]),
    ("capdot;", [0x2A40, 0x0000]),
    ("caps;", [0x2229, 0xFE00]),
    ("caret;", [0x2041, 0x0000]),
    ("caron;", [0x02C7, 0x0000]),
    ("ccaps;", [0x2A4D, 0x0000]),
    ("ccaron;", [0x010D, 0x0000]),
    ("ccedil", [0x00E7, 0x0000]),
    ("ccedil;", [0x00E7, 0x0000]),
    ("ccirc;", [0x0109, 0x0000]),
    ("ccups;", [0x2A4C, 0x0000]),
    ("ccupssm;", [0x2A50, 0x0000]),
    ("cdot;", [0x010B, 0x0000]),
    ("cedil", [0x00B8, 0x0000]),
    ("cedil;", [0x00B8, 0x0000]),
    ("cemptyv;", [0x29B2, 0x0000]),
    ("cent", [0x00A2, 0x0000]),
    ("cent;", [0x00A2, 0x0000]),
    ("centerdot;", [0x00B7, 0x0000]),
    ("cfr;", [0x1D520, 0x0000]),
    ("chcy;", [0x0447, 0x0000]),
    ("check;", [0x2713, 0x0000]),
    ("checkmark;", [0x2713, 0x0000]),
    ("chi;", [0x03C7, 0x0000]),
    ("cir;", [0x25CB, 0x0000]),
    ("cirE;", [0x29C3, 0x0000]),
    ("circ;", [0x02C6, 0x0000]),
    ("circeq;", [0x2257, 0x0000]),
    ("circlearrowleft;", [0x21BA, 0x0000]),
    ("circlearrowright;", [0x21BB, 0x0000]),
    ("circledR;", [0x00AE, 0x0000]),
    ("circledS;", [0x24C8, 0x0000]),
    ("circledast;", [0x229B, 0x0000]),
    ("circledcirc;", [0x229A, 0x0000]),
    ("circleddash;", [0x229D, 0x0000]),
    ("cire;", [0x2257, 0x0000]),
    ("cirfnint;", [0x2A10, 0x0000]),
    ("cirmid;", [0x2AEF, 0x0000]),
    ("cirscir;", [0x29C2, 0x0000]),
    ("clubs;", [0x2663, 0x0000]),
    ("clubsuit;", [0x2663, 0x0000]),
    ("colon;", [0x003A, 0x0000]),
    ("colone;", [0x2254, 0x0000]),
    ("coloneq;", [0x2254, 0x0000]),
    ("comma;", [0x002C, 0x0000]),
    ("commat;", [0x0040, 0x0000]),
    ("comp;", [0x2201, 0x0000]),
    ("compfn;", [0x2218, 0x0000]),
    ("complement;", [0x2201, 0x0000]),
    ("complexes;", [0x2102, 0x0000]),
    ("cong;", [0x2245, 0x0000]),
    ("congdot;", [0x2A6D, 0x0000]),
    ("conint;", [0x222E, 0x0000]),
    ("copf;", [0x1D554, 0x0000]),
    ("coprod;", [0x2210, 0x0000]),
    ("copy", [0x00A9, 0x0000]),
    ("copy;", [0x00A9, 0x0000]),
    ("copysr;", [0x2117, 0x0000]),
    ("crarr;", [0x21B5, 0x0000]),
    ("cross;", [0x2717, 0x0000]),
    ("cscr;", [0x1D4B8, 0x0000]),
    ("csub;", [0x2ACF, 0x0000]),
    ("csube;", [0x2AD1, 0x0000]),
    ("csup;", [0x2AD0, 0x0000]),
    ("csupe;", [0x2AD2, 0x0000]),
    ("ctdot;", [0x22EF, 0x0000]),
    ("cudarrl;", [0x2938, 0x0000]),
    ("cudarrr;", [0x2935, 0x0000]),
    ("cuepr;", [0x22DE, 0x0000]),
    ("cuesc;", [0x22DF, 0x0000]),
    ("cularr;", [0x21B6, 0x0000]),
    ("cularrp;", [0x293D, 0x0000]),
    ("cup;", [0x222A, 0x0000]),
    ("cupbrcap;", [0x2A48, 0x0000]),
    ("cupcap;", [0x2A46, 0x0000]),
    ("cupcup;", [0x2A4A, 0x0000]),
    ("cupdot;", [0x228D, 0x0000]),
    ("cupor;", [0x2A45, 0x0000]),
    ("cups;", [0x222A, 0xFE00]),
    ("curarr;", [0x21B7, 0x0000]),
    ("curarrm;", [0x293C, 0x0000]),
    ("curlyeqprec;", [0x22DE, 0x0000]),
    ("curlyeqsucc;", [0x22DF, 0x0000]),
    ("curlyvee;", [0x22CE, 0x0000]),
    ("curlywedge;", [0x22CF, 0x0000]),
    ("curren", [0x00A4, 0x0000]),
    ("curren;", [0x00A4, 0x0000]),
    ("curvearrowleft;", [0x21B6, 0x0000]),
    ("curvearrowright;", [0x21B7, 0x0000]),
    ("cuvee;", [0x22CE, 0x0000]),
    ("cuwed;", [0x22CF, 0x0000]),
    ("cwconint;", [0x2232, 0x0000]),
    ("cwint;", [0x2231, 0x0000]),
    ("cylcty;", [0x232D, 0x0000]),
    ("dArr;", [0x21D3, 0x0000]),
    ("dHar;", [0x2965, 0x0000]),
    ("dagger;", [0x2020, 0x0000]),
    ("daleth;", [0x2138, 0x0000]),
    ("darr;", [0x2193, 0x0000]),
    ("dash;", [0x2010, 0x0000]),
    ("dashv;", [0x22A3, 0x0000]),
    ("dbkarow;", [0x290F, 0x0000]),
    ("dblac;", [0x02DD, 0x0000]),
    ("dcaron;", [0x010F, 0x0000]),
    ("dcy;", [0x0434, 0x0000]),
    ("dd;", [0x2146, 0x0000]),
    ("ddagger;", [0x2021, 0x0000]),
    ("ddarr;", [0x21CA, 0x0000]),
    ("ddotseq;", [0x2A77, 0x0000]),
    ("deg", [0x00B0, 0x0000]),
    ("deg;", [0x00B0, 0x0000]),
    ("delta;", [0x03B4, 0x0000]),
    ("demptyv;", [0x29B1, 0x0000]),
    ("dfisht;", [0x297F, 0x0000]),
    ("dfr;", [0x1D521, 0x0000]),
    ("dharl;", [0x21C3, 0x0000]),
    ("dharr;", [0x21C2, 0x0000]),
    ("diam;", [0x22C4, 0x0000]),
    ("diamond;", [0x22C4, 0x0000]),
    ("diamondsuit;", [0x2666, 0x0000]),
    ("diams;", [0x2666, 0x0000]),
    ("die;", [0x00A8, 0x0000]),
    ("digamma;", [0x03DD, 0x0000]),
    ("disin;", [0x22F2, 0x0000]),
    ("div;", [0x00F7, 0x0000]),
    ("divide", [0x00F7, 0x0000]),
    ("divide;", [0x00F7, 0x0000]),
    ("divideontimes;", [0x22C7, 0x0000]),
    ("divonx;", [0x22C7, 0x0000]),
    ("djcy;", [0x0452, 0x0000]),
    ("dlcorn;", [0x231E, 0x0000]),
    ("dlcrop;", [0x230D, 0x0000]),
    ("dollar;", [0x0024, 0x0000]),
    ("dopf;", [0x1D555, 0x0000]),
    ("dot;", [0x02D9, 0x0000]),
    ("doteq;", [0x2250, 0x0000]),
    ("doteqdot;", [0x2251, 0x0000]),
    ("dotminus;", [0x2238, 0x0000]),
    ("dotplus;", [0x2214, 0x0000]),
    ("dotsquare;", [0x22A1, 0x0000]),
    ("doublebarwedge;", [0x2306, 0x0000]),
    ("downarrow;", [0x2193, 0x0000]),
    ("downdownarrows;", [0x21CA, 0x0000]),
    ("downharpoonleft;", [0x21C3, 0x0000]),
    ("downharpoonright;", [0x21C2, 0x0000]),
    ("drbkarow;", [0x2910, 0x0000]),
    ("drcorn;", [0x231F, 0x0000]),
    ("drcrop;", [0x230C, 0x0000]),
    ("dscr;", [0x1D4B9, 0x0000]),
    ("dscy;", [0x0455, 0x0000]),
    ("dsol;", [0x29F6, 0x0000]),
    ("dstrok;", [0x0111, 0x0000]),
    ("dtdot;", [0x22F1, 0x0000]),
    ("dtri;", [0x25BF, 0x0000]),
    ("dtrif;", [0x25BE, 0x0000]),
    ("duarr;", [0x21F5, 0x0000]),
    ("duhar;", [0x296F, 0x0000]),
    ("dwangle;", [0x29A6, 0x0000]),
    ("dzcy;", [0x045F, 0x0000]),
    ("dzigrarr;", [0x27FF, 0x0000]),
    ("eDDot;", [0x2A77, 0x0000]),
    ("eDot;", [0x2251, 0x0000]),
    ("eacute", [0x00E9, 0x0000]),
    ("eacute;", [0x00E9, 0x0000]),
    ("easter;", [0x2A6E, 0x0000]),
    ("ecaron;", [0x011B, 0x0000]),
    ("ecir;", [0x2256, 0x0000]),
    ("ecirc", [0x00EA, 0x0000]),
    ("ecirc;", [0x00EA, 0x0000]),
    ("ecolon;", [0x2255, 0x0000]),
    ("ecy;", [0x044D, 0x0000]),
    ("edot;", [0x0117, 0x0000]),
    ("ee;", [0x2147, 0x0000]),
    ("efDot;", [0x2252, 0x0000]),
    ("efr;", [0x1D522, 0x0000]),
    ("eg;", [0x2A9A, 0x0000]),
    ("egrave", [0x00E8, 0x0000]),
    ("egrave;", [0x00E8, 0x0000]),
    ("egs;", [0x2A96, 0x0000]),
    ("egsdot;", [0x2A98, 0x0000]),
    ("el;", [0x2A99, 0x0000]),
    ("elinters;", [0x23E7, 0x0000]),
    ("ell;", [0x2113, 0x0000]),
    ("els;", [0x2A95, 0x0000]),
    ("elsdot;", [0x2A97, 0x0000]),
    ("emacr;", [0x0113, 0x0000]),
    ("empty;", [0x2205, 0x0000]),
    ("emptyset;", [0x2205, 0x0000]),
    ("emptyv;", [0x2205, 0x0000]),
    ("emsp13;", [0x2004, 0x0000]),
    ("emsp14;", [0x2005, 0x0000]),
    ("emsp;", [0x2003, 0x0000]),
    ("eng;", [0x014B, 0x0000]),
    ("ensp;", [0x2002, 0x0000]),
    ("eogon;", [0x0119, 0x0000]),
    ("eopf;", [0x1D556, 0x0000]),
    ("epar;", [0x22D5, 0x0000]),
    ("eparsl;", [0x29E3, 0x0000]),
    ("eplus;", [0x2A71, 0x0000]),
    ("epsi;", [0x03B5, 0x0000]),
    ("epsilon;", [0x03B5, 0x0000]),
    ("epsiv;", [0x03F5, 0x0000]),
    ("eqcirc;", [0x2256, 0x0000]),
    ("eqcolon;", [0x2255, 0x0000]),
    ("eqsim;", [0x2242, 0x0000]),
    ("eqslantgtr;", [0x2A96, 0x0000]),
    ("eqslantless;", [0x2A95, 0x0000]),
    ("equals;", [0x003D, 0x0000]),
    ("equest;", [0x225F, 0x0000]),
    ("equiv;", [0x2261, 0x0000]),
    ("equivDD;", [0x2A78, 0x0000]),
    ("eqvparsl;", [0x29E5, 0x0000]),
    ("erDot;", [0x2253, 0x0000]),
    ("erarr;", [0x2971, 0x0000]),
    ("escr;", [0x212F, 0x0000]),
    ("esdot;", [0x2250, 0x0000]),
    ("esim;", [0x2242, 0x0000]),
    ("eta;", [0x03B7, 0x0000]),
    ("eth", [0x00F0, 0x0000]),
    ("eth;", [0x00F0, 0x0000]),
    ("euml", [0x00EB, 0x0000]),
    ("euml;", [0x00EB, 0x0000]),
    ("euro;", [0x20AC, 0x0000]),
    ("excl;", [0x0021, 0x0000]),
    ("exist;", [0x2203, 0x0000]),
    ("expectation;", [0x2130, 0x0000]),
    ("exponentiale;", [0x2147, 0x0000]),
    ("fallingdotseq;", [0x2252, 0x0000]),
    ("fcy;", [0x0444, 0x0000]),
    ("female;", [0x2640, 0x0000]),
    ("ffilig;", [0xFB03, 0x0000]),
    ("fflig;", [0xFB00, 0x0000]),
    ("ffllig;", [0xFB04, 0x0000]),
    ("ffr;", [0x1D523, 0x0000]),
    ("filig;", [0xFB01, 0x0000]),
    ("fjlig;", [0x0066, 0x006A]),
    ("flat;", [0x266D, 0x0000]),
    ("fllig;", [0xFB02, 0x0000]),
    ("fltns;", [0x25B1, 0x0000]),
    ("fnof;", [0x0192, 0x0000]),
    ("fopf;", [0x1D557, 0x0000]),
    ("forall;", [0x2200, 0x0000]),
    ("fork;", [0x22D4, 0x0000]),
    ("forkv;", [0x2AD9, 0x0000]),
    ("fpartint;", [0x2A0D, 0x0000]),
    ("frac12", [0x00BD, 0x0000]),
    ("frac12;", [0x00BD, 0x0000]),
    ("frac13;", [0x2153, 0x0000]),
    ("frac14", [0x00BC, 0x0000]),
    ("frac14;", [0x00BC, 0x0000]),
    ("frac15;", [0x2155, 0x0000]),
    ("frac16;", [0x2159, 0x0000]),
    ("frac18;", [0x215B, 0x0000]),
    ("frac23;", [0x2154, 0x0000]),
    ("frac25;", [0x2156, 0x0000]),
    ("frac34", [0x00BE, 0x0000]),
    ("frac34;", [0x00BE, 0x0000]),
    ("frac35;", [0x2157, 0x0000]),
    ("frac38;", [0x215C, 0x0000]),
    ("frac45;", [0x2158, 0x0000]),
    ("frac56;", [0x215A, 0x0000]),
    ("frac58;", [0x215D, 0x0000]),
    ("frac78;", [0x215E, 0x0000]),
    ("frasl;", [0x2044, 0x0000]),
    ("frown;", [0x2322, 0x0000]),
    ("fscr;", [0x1D4BB, 0x0000]),
    ("gE;", [0x2267, 0x0000]),
    ("gEl;", [0x2A8C, 0x0000]),
    ("gacute;", [0x01F5, 0x0000]),
    ("gamma;", [0x03B3, 0x0000]),
    ("gammad;", [0x03DD, 0x0000]),
    ("gap;", [0x2A86, 0x0000]),
    ("gbreve;", [0x011F, 0x0000]),
    ("gcirc;", [0x011D, 0x0000]),
    ("gcy;", [0x0433, 0x0000]),
    ("gdot;", [0x0121, 0x0000]),
    ("ge;", [0x2265, 0x0000]),
    ("gel;", [0x22DB, 0x0000]),
    ("geq;", [0x2265, 0x0000]),
    ("geqq;", [0x2267, 0x0000]),
    ("geqslant;", [0x2A7E, 0x0000]),
    ("ges;", [0x2A7E, 0x0000]),
    ("gescc;", [0x2AA9, 0x0000]),
    ("gesdot;", [0x2A80, 0x0000]),
    ("gesdoto;", [0x2A82, 0x0000]),
    ("gesdotol;", [0x2A84, 0x0000]),
    ("gesl;", [0x22DB, 0xFE00]),
    ("gesles;", [0x2A94, 0x0000]),
    ("gfr;", [0x1D524, 0x0000]),
    ("gg;", [0x226B, 0x0000]),
    ("ggg;", [0x22D9, 0x0000]),
    ("gimel;", [0x2137, 0x0000]),
    ("gjcy;", [0x0453, 0x0000]),
    ("gl;", [0x2277, 0x0000]),
    ("glE;", [0x2A92, 0x0000]),
    ("gla;", [0x2AA5, 0x0000]),
    ("glj;", [0x2AA4, 0x0000]),
    ("gnE;", [0x2269, 0x0000]),
    ("gnap;", [0x2A8A, 0x0000]),
    ("gnapprox;", [0x2A8A, 0x0000]),
    ("gne;", [0x2A88, 0x0000]),
    ("gneq;", [0x2A88, 0x0000]),
    ("gneqq;", [0x2269, 0x0000]),
    ("gnsim;", [0x22E7, 0x0000]),
    ("gopf;", [0x1D558, 0x0000]),
    ("grave;", [0x0060, 0x0000]),
    ("gscr;", [0x210A, 0x0000]),
    ("gsim;", [0x2273, 0x0000]),
    ("gsime;", [0x2A8E, 0x0000]),
    ("gsiml;", [0x2A90, 0x0000]),
    ("gt", [0x003E, 0x0000]),
    ("gt;", [0x003E, 0x0000]),
    ("gtcc;", [0x2AA7, 0x0000]),
    ("gtcir;", [0x2A7A, 0x0000]),
    ("gtdot;", [0x22D7, 0x0000]),
    ("gtlPar;", [0x2995, 0x0000]),
    ("gtquest;", [0x2A7C, 0x0000]),
    ("gtrapprox;", [0x2A86, 0x0000]),
    ("gtrarr;", [0x2978, 0x0000]),
    ("gtrdot;", [0x22D7, 0x0000]),
    ("gtreqless;", [0x22DB, 0x0000]),
    ("gtreqqless;", [0x2A8C, 0x0000]),
    ("gtrless;", [0x2277, 0x0000]),
    ("gtrsim;", [0x2273, 0x0000]),
    ("gvertneqq;", [0x2269, 0xFE00]),
    ("gvnE;", [0x2269, 0xFE00]),
    ("hArr;", [0x21D4, 0x0000]),
    ("hairsp;", [0x200A, 0x0000]),
    ("half;", [0x00BD, 0x0000]),
    ("hamilt;", [0x210B, 0x0000]),
    ("hardcy;", [0x044A, 0x0000]),
    ("harr;", [0x2194, 0x0000]),
    ("harrcir;", [0x2948, 0x0000]),
    ("harrw;", [0x21AD, 0x0000]),
    ("hbar;", [0x210F, 0x0000]),
    ("hcirc;", [0x0125, 0x0000]),
    ("hearts;", [0x2665, 0x0000]),
    ("heartsuit;", [0x2665, 0x0000]),
    ("hellip;", [0x2026, 0x0000]),
    ("hercon;", [0x22B9, 0x0000]),
    ("hfr;", [0x1D525, 0x0000]),
    ("hksearow;", [0x2925, 0x0000]),
    ("hkswarow;", [0x2926, 0x0000]),
    ("hoarr;", [0x21FF, 0x0000]),
    ("homtht;", [0x223B, 0x0000]),
    ("hookleftarrow;", [0x21A9, 0x0000]),
    ("hookrightarrow;", [0x21AA, 0x0000]),
    ("hopf;", [0x1D559, 0x0000]),
    ("horbar;", [0x2015, 0x0000]),
    ("hscr;", [0x1D4BD, 0x0000]),
    ("hslash;", [0x210F, 0x0000]),
    ("hstrok;", [0x0127, 0x0000]),
    ("hybull;", [0x2043, 0x0000]),
    ("hyphen;", [0x2010, 0x0000]),
    ("iacute", [0x00ED, 0x0000]),
    ("iacute;", [0x00ED, 0x0000]),
    ("ic;", [0x2063, 0x0000]),
    ("icirc", [0x00EE, 0x0000]),
    ("icirc;", [0x00EE, 0x0000]),
    ("icy;", [0x0438, 0x0000]),
    ("iecy;", [0x0435, 0x0000]),
    ("iexcl", [0x00A1, 0x0000]),
    ("iexcl;", [0x00A1, 0x0000]),
    ("iff;", [0x21D4, 0x0000]),
    ("ifr;", [0x1D526, 0x0000]),
    ("igrave", [0x00EC, 0x0000]),
    ("igrave;", [0x00EC, 0x0000]),
    ("ii;", [0x2148, 0x0000]),
    ("iiiint;", [0x2A0C, 0x0000]),
    ("iiint;", [0x222D, 0x0000]),
    ("iinfin;", [0x29DC, 0x0000]),
    ("iiota;", [0x2129, 0x0000]),
    ("ijlig;", [0x0133, 0x0000]),
    ("imacr;", [0x012B, 0x0000]),
    ("image;", [0x2111, 0x0000]),
    ("imagline;", [0x2110, 0x0000]),
    ("imagpart;", [0x2111, 0x0000]),
    ("imath;", [0x0131, 0x0000]),
    ("imof;", [0x22B7, 0x0000]),
    ("imped;", [0x01B5, 0x0000]),
    ("in;", [0x2208, 0x0000]),
    ("incare;", [0x2105, 0x0000]),
    ("infin;", [0x221E, 0x0000]),
    ("infintie;", [0x29DD, 0x0000]),
    ("inodot;", [0x0131, 0x0000]),
    ("int;", [0x222B, 0x0000]),
    ("intcal;", [0x22BA, 0x0000]),
    ("integers;", [0x2124, 0x0000]),
    ("intercal;", [0x22BA, 0x0000]),
    ("intlarhk;", [0x2A17, 0x0000]),
    ("intprod;", [0x2A3C, 0x0000]),
    ("iocy;", [0x0451, 0x0000]),
    ("iogon;", [0x012F, 0x0000]),
    ("iopf;", [0x1D55A, 0x0000]),
    ("iota;", [0x03B9, 0x0000]),
    ("iprod;", [0x2A3C, 0x0000]),
    ("iquest", [0x00BF, 0x0000]),
    ("iquest;", [0x00BF, 0x0000]),
    ("iscr;", [0x1D4BE, 0x0000]),
    ("isin;", [0x2208, 0x0000]),
    ("isinE;", [0x22F9, 0x0000]),
    ("isindot;", [0x22F5, 0x0000]),
    ("isins;", [0x22F4, 0x0000]),
    ("isinsv;", [0x22F3, 0x0000]),
    ("isinv;", [0x2208, 0x0000]),
    ("it;", [0x2062, 0x0000]),
    ("itilde;", [0x0129, 0x0000]),
    ("iukcy;", [0x0456, 0x0000]),
    ("iuml", [0x00EF, 0x0000]),
    ("iuml;", [0x00EF, 0x0000]),
    ("jcirc;", [0x0135, 0x0000]),
    ("jcy;", [0x0439, 0x0000]),
    ("jfr;", [0x1D527, 0x0000]),
    ("jmath;", [0x0237, 0x0000]),
    ("jopf;", [0x1D55B, 0x0000]),
    ("jscr;", [0x1D4BF, 0x0000]),
    ("jsercy;", [0x0458, 0x0000]),
    ("jukcy;", [0x0454, 0x0000]),
    ("kappa;", [0x03BA, 0x0000]),
    ("kappav;", [0x03F0, 0x0000]),
    ("kcedil;", [0x0137, 0x0000]),
    ("kcy;", [0x043A, 0x0000]),
    ("kfr;", [0x1D528, 0x0000]),
    ("kgreen;", [0x0138, 0x0000]),
    ("khcy;", [0x0445, 0x0000]),
    ("kjcy;", [0x045C, 0x0000]),
    ("kopf;", [0x1D55C, 0x0000]),
    ("kscr;", [0x1D4C0, 0x0000]),
    ("lAarr;", [0x21DA, 0x0000]),
    ("lArr;", [0x21D0, 0x0000]),
    ("lAtail;", [0x291B, 0x0000]),
    ("lBarr;", [0x290E, 0x0000]),
    ("lE;", [0x2266, 0x0000]),
    ("lEg;", [0x2A8B, 0x0000]),
    ("lHar;", [0x2962, 0x0000]),
    ("lacute;", [0x013A, 0x0000]),
    ("laemptyv;", [0x29B4, 0x0000]),
    ("lagran;", [0x2112, 0x0000]),
    ("lambda;", [0x03BB, 0x0000]),
    ("lang;", [0x27E8, 0x0000]),
    ("langd;", [0x2991, 0x0000]),
    ("langle;", [0x27E8, 0x0000]),
    ("lap;", [0x2A85, 0x0000]),
    ("laquo", [0x00AB, 0x0000]),
    ("laquo;", [0x00AB, 0x0000]),
    ("larr;", [0x2190, 0x0000]),
    ("larrb;", [0x21E4, 0x0000]),
    ("larrbfs;", [0x291F, 0x0000]),
    ("larrfs;", [0x291D, 0x0000]),
    ("larrhk;", [0x21A9, 0x0000]),
    ("larrlp;", [0x21AB, 0x0000]),
    ("larrpl;", [0x2939, 0x0000]),
    ("larrsim;", [0x2973, 0x0000]),
    ("larrtl;", [0x21A2, 0x0000]),
    ("lat;", [0x2AAB, 0x0000]),
    ("latail;", [0x2919, 0x0000]),
    ("late;", [0x2AAD, 0x0000]),
    ("lates;", [0x2AAD, 0xFE00]),
    ("lbarr;", [0x290C, 0x0000]),
    ("lbbrk;", [0x2772, 0x0000]),
    ("lbrace;", [0x007B, 0x0000]),
    ("lbrack;", [0x005B, 0x0000]),
    ("lbrke;", [0x298B, 0x0000]),
    ("lbrksld;", [0x298F, 0x0000]),
    ("lbrkslu;", [0x298D, 0x0000]),
    ("lcaron;", [0x013E, 0x0000]),
    ("lcedil;", [0x013C, 0x0000]),
    ("lceil;", [0x2308, 0x0000]),
    ("lcub;", [0x007B, 0x0000]),
    ("lcy;", [0x043B, 0x0000]),
    ("ldca;", [0x2936, 0x0000]),
    ("ldquo;", [0x201C, 0x0000]),
    ("ldquor;", [0x201E, 0x0000]),
    ("ldrdhar;", [0x2967, 0x0000]),
    ("ldrushar;", [0x294B, 0x0000]),
    ("ldsh;", [0x21B2, 0x0000]),
    ("le;", [0x2264, 0x0000]),
    ("leftarrow;", [0x2190, 0x0000]),
    ("leftarrowtail;", [0x21A2, 0x0000]),
    ("leftharpoondown;", [0x21BD, 0x0000]),
    ("leftharpoonup;", [0x21BC, 0x0000]),
    ("leftleftarrows;", [0x21C7, 0x0000]),
    ("leftrightarrow;", [0x2194, 0x0000]),
    ("leftrightarrows;", [0x21C6, 0x0000]),
    ("leftrightharpoons;", [0x21CB, 0x0000]),
    ("leftrightsquigarrow;", [0x21AD, 0x0000]),
    ("leftthreetimes;", [0x22CB, 0x0000]),
    ("leg;", [0x22DA, 0x0000]),
    ("leq;", [0x2264, 0x0000]),
    ("leqq;", [0x2266, 0x0000]),
    ("leqslant;", [0x2A7D, 0x0000]),
    ("les;", [0x2A7D, 0x0000]),
    ("lescc;", [0x2AA8, 0x0000]),
    ("lesdot;", [0x2A7F, 0x0000]),
    ("lesdoto;", [0x2A81, 0x0000]),
    ("lesdotor;", [0x2A83, 0x0000]),
    ("lesg;", [0x22DA, 0xFE00]),
    ("lesges;", [0x2A93, 0x0000]),
    ("lessapprox;", [0x2A85, 0x0000]),
    ("lessdot;", [0x22D6, 0x0000]),
    ("lesseqgtr;", [0x22DA, 0x0000]),
    ("lesseqqgtr;", [0x2A8B, 0x0000]),
    ("lessgtr;", [0x2276, 0x0000]),
    ("lesssim;", [0x2272, 0x0000]),
    ("lfisht;", [0x297C, 0x0000]),
    ("lfloor;", [0x230A, 0x0000]),
    ("lfr;", [0x1D529, 0x0000]),
    ("lg;", [0x2276, 0x0000]),
    ("lgE;", [0x2A91, 0x0000]),
    ("lhard;", [0x21BD, 0x0000]),
    ("lharu;", [0x21BC, 0x0000]),
    ("lharul;", [0x296A, 0x0000]),
    ("lhblk;", [0x2584, 0x0000]),
    ("ljcy;", [0x0459, 0x0000]),
    ("ll;", [0x226A, 0x0000]),
    ("llarr;", [0x21C7, 0x0000]),
    ("llcorner;", [0x231E, 0x0000]),
    ("llhard;", [0x296B, 0x0000]),
    ("lltri;", [0x25FA, 0x0000]),
    ("lmidot;", [0x0140, 0x0000]),
    ("lmoust;", [0x23B0, 0x0000]),
    ("lmoustache;", [0x23B0, 0x0000]),
    ("lnE;", [0x2268, 0x0000]),
    ("lnap;", [0x2A89, 0x0000]),
    ("lnapprox;", [0x2A89, 0x0000]),
    ("lne;", [0x2A87, 0x0000]),
    ("lneq;", [0x2A87, 0x0000]),
    ("lneqq;", [0x2268, 0x0000]),
    ("lnsim;", [0x22E6, 0x0000]),
    ("loang;", [0x27EC, 0x0000]),
    ("loarr;", [0x21FD, 0x0000]),
    ("lobrk;", [0x27E6, 0x0000]),
    ("longleftarrow;", [0x27F5, 0x0000]),
    ("longleftrightarrow;", [0x27F7, 0x0000]),
    ("longmapsto;", [0x27FC, 0x0000]),
    ("longrightarrow;", [0x27F6, 0x0000]),
    ("looparrowleft;", [0x21AB, 0x0000]),
    ("looparrowright;", [0x21AC, 0x0000]),
    ("lopar;", [0x2985, 0x0000]),
    ("lopf;", [0x1D55D, 0x0000]),
    ("loplus;", [0x2A2D, 0x0000]),
    ("lotimes;", [0x2A34, 0x0000]),
    ("lowast;", [0x2217, 0x0000]),
    ("lowbar;", [0x005F, 0x0000]),
    ("loz;", [0x25CA, 0x0000]),
    ("lozenge;", [0x25CA, 0x0000]),
    ("lozf;", [0x29EB, 0x0000]),
    ("lpar;", [0x0028, 0x0000]),
    ("lparlt;", [0x2993, 0x0000]),
    ("lrarr;", [0x21C6, 0x0000]),
    ("lrcorner;", [0x231F, 0x0000]),
    ("lrhar;", [0x21CB, 0x0000]),
    ("lrhard;", [0x296D, 0x0000]),
    ("lrm;", [0x200E, 0x0000]),
    ("lrtri;", [0x22BF, 0x0000]),
    ("lsaquo;", [0x2039, 0x0000]),
    ("lscr;", [0x1D4C1, 0x0000]),
    ("lsh;", [0x21B0, 0x0000]),
    ("lsim;", [0x2272, 0x0000]),
    ("lsime;", [0x2A8D, 0x0000]),
    ("lsimg;", [0x2A8F, 0x0000]),
    ("lsqb;", [0x005B, 0x0000]),
    ("lsquo;", [0x2018, 0x0000]),
    ("lsquor;", [0x201A, 0x0000]),
    ("lstrok;", [0x0142, 0x0000]),
    ("lt", [0x003C, 0x0000]),
    ("lt;", [0x003C, 0x0000]),
    ("ltcc;", [0x2AA6, 0x0000]),
    ("ltcir;", [0x2A79, 0x0000]),
    ("ltdot;", [0x22D6, 0x0000]),
    ("lthree;", [0x22CB, 0x0000]),
    ("ltimes;", [0x22C9, 0x0000]),
    ("ltlarr;", [0x2976, 0x0000]),
    ("ltquest;", [0x2A7B, 0x0000]),
    ("ltrPar;", [0x2996, 0x0000]),
    ("ltri;", [0x25C3, 0x0000]),
    ("ltrie;", [0x22B4, 0x0000]),
    ("ltrif;", [0x25C2, 0x0000]),
    ("lurdshar;", [0x294A, 0x0000]),
    ("luruhar;", [0x2966, 0x0000]),
    ("lvertneqq;", [0x2268, 0xFE00]),
    ("lvnE;", [0x2268, 0xFE00]),
    ("mDDot;", [0x223A, 0x0000]),
    ("macr", [0x00AF, 0x0000]),
    ("macr;", [0x00AF, 0x0000]),
    ("male;", [0x2642, 0x0000]),
    ("malt;", [0x2720, 0x0000]),
    ("maltese;", [0x2720, 0x0000]),
    ("map;", [0x21A6, 0x0000]),
    ("mapsto;", [0x21A6, 0x0000]),
    ("mapstodown;", [0x21A7, 0x0000]),
    ("mapstoleft;", [0x21A4, 0x0000]),
    ("mapstoup;", [0x21A5, 0x0000]),
    ("marker;", [0x25AE, 0x0000]),
    ("mcomma;", [0x2A29, 0x0000]),
    ("mcy;", [0x043C, 0x0000]),
    ("mdash;", [0x2014, 0x0000]),
    ("measuredangle;", [0x2221, 0x0000]),
    ("mfr;", [0x1D52A, 0x0000]),
    ("mho;", [0x2127, 0x0000]),
    ("micro", [0x00B5, 0x0000]),
    ("micro;", [0x00B5, 0x0000]),
    ("mid;", [0x2223, 0x0000]),
    ("midast;", [0x002A, 0x0000]),
    ("midcir;", [0x2AF0, 0x0000]),
    ("middot", [0x00B7, 0x0000]),
    ("middot;", [0x00B7, 0x0000]),
    ("minus;", [0x2212, 0x0000]),
    ("minusb;", [0x229F, 0x0000]),
    ("minusd;", [0x2238, 0x0000]),
    ("minusdu;", [0x2A2A, 0x0000]),
    ("mlcp;", [0x2ADB, 0x0000]),
    ("mldr;", [0x2026, 0x0000]),
    ("mnplus;", [0x2213, 0x0000]),
    ("models;", [0x22A7, 0x0000]),
    ("mopf;", [0x1D55E, 0x0000]),
    ("mp;", [0x2213, 0x0000]),
    ("mscr;", [0x1D4C2, 0x0000]),
    ("mstpos;", [0x223E, 0x0000]),
    ("mu;", [0x03BC, 0x0000]),
    ("multimap;", [0x22B8, 0x0000]),
    ("mumap;", [0x22B8, 0x0000]),
    ("nGg;", [0x22D9, 0x0338]),
    ("nGt;", [0x226B, 0x20D2]),
    ("nGtv;", [0x226B, 0x0338]),
    ("nLeftarrow;", [0x21CD, 0x0000]),
    ("nLeftrightarrow;", [0x21CE, 0x0000]),
    ("nLl;", [0x22D8, 0x0338]),
    ("nLt;", [0x226A, 0x20D2]),
    ("nLtv;", [0x226A, 0x0338]),
    ("nRightarrow;", [0x21CF, 0x0000]),
    ("nVDash;", [0x22AF, 0x0000]),
    ("nVdash;", [0x22AE, 0x0000]),
    ("nabla;", [0x2207, 0x0000]),
    ("nacute;", [0x0144, 0x0000]),
    ("nang;", [0x2220, 0x20D2]),
    ("nap;", [0x2249, 0x0000]),
    ("napE;", [0x2A70, 0x0338]),
    ("napid;", [0x224B, 0x0338]),
    ("napos;", [0x0149, 0x0000]),
    ("napprox;", [0x2249, 0x0000]),
    ("natur;", [0x266E, 0x0000]),
    ("natural;", [0x266E, 0x0000]),
    ("naturals;", [0x2115, 0x0000]),
    ("nbsp", [0x00A0, 0x0000]),
    ("nbsp;", [0x00A0, 0x0000]),
    ("nbump;", [0x224E, 0x0338]),
    ("nbumpe;", [0x224F, 0x0338]),
    ("ncap;", [0x2A43, 0x0000]),
    ("ncaron;", [0x0148, 0x0000]),
    ("ncedil;", [0x0146, 0x0000]),
    ("ncong;", [0x2247, 0x0000]),
    ("ncongdot;", [0x2A6D, 0x0338]),
    ("ncup;", [0x2A42, 0x0000]),
    ("ncy;", [0x043D, 0x0000]),
    ("ndash;", [0x2013, 0x0000]),
    ("ne;", [0x2260, 0x0000]),
    ("neArr;", [0x21D7, 0x0000]),
    ("nearhk;", [0x2924, 0x0000]),
    ("nearr;", [0x2197, 0x0000]),
    ("nearrow;", [0x2197, 0x0000]),
    ("nedot;", [0x2250, 0x0338]),
    ("nequiv;", [0x2262, 0x0000]),
    ("nesear;", [0x2928, 0x0000]),
    ("nesim;", [0x2242, 0x0338]),
    ("nexist;", [0x2204, 0x0000]),
    ("nexists;", [0x2204, 0x0000]),
    ("nfr;", [0x1D52B, 0x0000]),
    ("ngE;", [0x2267, 0x0338]),
    ("nge;", [0x2271, 0x0000]),
    ("ngeq;", [0x2271, 0x0000]),
    ("ngeqq;", [0x2267, 0x0338]),
    ("ngeqslant;", [0x2A7E, 0x0338]),
    ("nges;", [0x2A7E, 0x0338]),
    ("ngsim;", [0x2275, 0x0000]),
    ("ngt;", [0x226F, 0x0000]),
    ("ngtr;", [0x226F, 0x0000]),
    ("nhArr;", [0x21CE, 0x0000]),
    ("nharr;", [0x21AE, 0x0000]),
    ("nhpar;", [0x2AF2, 0x0000]),
    ("ni;", [0x220B, 0x0000]),
    ("nis;", [0x22FC, 0x0000]),
    ("nisd;", [0x22FA, 0x0000]),
    ("niv;", [0x220B, 0x0000]),
    ("njcy;", [0x045A, 0x0000]),
    ("nlArr;", [0x21CD, 0x0000]),
    ("nlE;", [0x2266, 0x0338]),
    ("nlarr;", [0x219A, 0x0000]),
    ("nldr;", [0x2025, 0x0000]),
    ("nle;", [0x2270, 0x0000]),
    ("nleftarrow;", [0x219A, 0x0000]),
    ("nleftrightarrow;", [0x21AE, 0x0000]),
    ("nleq;", [0x2270, 0x0000]),
    ("nleqq;", [0x2266, 0x0338]),
    ("nleqslant;", [0x2A7D, 0x0338]),
    ("nles;", [0x2A7D, 0x0338]),
    ("nless;", [0x226E, 0x0000]),
    ("nlsim;", [0x2274, 0x0000]),
    ("nlt;", [0x226E, 0x0000]),
    ("nltri;", [0x22EA, 0x0000]),
    ("nltrie;", [0x22EC, 0x0000]),
    ("nmid;", [0x2224, 0x0000]),
    ("nopf;", [0x1D55F, 0x0000]),
    ("not", [0x00AC, 0x0000]),
    ("not;", [0x00AC, 0x0000]),
    ("notin;", [0x2209, 0x0000]),
    ("notinE;", [0x22F9, 0x0338]),
    ("notindot;", [0x22F5, 0x0338]),
    ("notinva;", [0x2209, 0x0000]),
    ("notinvb;", [0x22F7, 0x0000]),
    ("notinvc;", [0x22F6, 0x0000]),
    ("notni;", [0x220C, 0x0000]),
    ("notniva;", [0x220C, 0x0000]),
    ("notnivb;", [0x22FE, 0x0000]),
    ("notnivc;", [0x22FD, 0x0000]),
    ("npar;", [0x2226, 0x0000]),
    ("nparallel;", [0x2226, 0x0000]),
    ("nparsl;", [0x2AFD, 0x20E5]),
    ("npart;", [0x2202, 0x0338]),
    ("npolint;", [0x2A14, 0x0000]),
    ("npr;", [0x2280, 0x0000]),
    ("nprcue;", [0x22E0, 0x0000]),
    ("npre;", [0x2AAF, 0x0338]),
    ("nprec;", [0x2280, 0x0000]),
    ("npreceq;", [0x2AAF, 0x0338]),
    ("nrArr;", [0x21CF, 0x0000]),
    ("nrarr;", [0x219B, 0x0000]),
    ("nrarrc;", [0x2933, 0x0338]),
    ("nrarrw;", [0x219D, 0x0338]),
    ("nrightarrow;", [0x219B, 0x0000]),
    ("nrtri;", [0x22EB, 0x0000]),
    ("nrtrie;", [0x22ED, 0x0000]),
    ("nsc;", [0x2281, 0x0000]),
    ("nsccue;", [0x22E1, 0x0000]),
    ("nsce;", [0x2AB0, 0x0338]),
    ("nscr;", [0x1D4C3, 0x0000]),
    ("nshortmid;", [0x2224, 0x0000]),
    ("nshortparallel;", [0x2226, 0x0000]),
    ("nsim;", [0x2241, 0x0000]),
    ("nsime;", [0x2244, 0x0000]),
    ("nsimeq;", [0x2244, 0x0000]),
    ("nsmid;", [0x2224, 0x0000]),
    ("nspar;", [0x2226, 0x0000]),
    ("nsqsube;", [0x22E2, 0x0000]),
    ("nsqsupe;", [0x22E3, 0x0000]),
    ("nsub;", [0x2284, 0x0000]),
    ("nsubE;", [0x2AC5, 0x0338]),
    ("nsube;", [0x2288, 0x0000]),
    ("nsubset;", [0x2282, 0x20D2]),
    ("nsubseteq;", [0x2288, 0x0000]),
    ("nsubseteqq;", [0x2AC5, 0x0338]),
    ("nsucc;", [0x2281, 0x0000]),
    ("nsucceq;", [0x2AB0, 0x0338]),
    ("nsup;", [0x2285, 0x0000]),
    ("nsupE;", [0x2AC6, 0x0338]),
    ("nsupe;", [0x2289, 0x0000]),
    ("nsupset;", [0x2283, 0x20D2]),
    ("nsupseteq;", [0x2289, 0x0000]),
    ("nsupseteqq;", [0x2AC6, 0x0338]),
    ("ntgl;", [0x2279, 0x0000]),
    ("ntilde", [0x00F1, 0x0000]),
    ("ntilde;", [0x00F1, 0x0000]),
    ("ntlg;", [0x2278, 0x0000]),
    ("ntriangleleft;", [0x22EA, 0x0000]),
    ("ntrianglelefteq;", [0x22EC, 0x0000]),
    ("ntriangleright;", [0x22EB, 0x0000]),
    ("ntrianglerighteq;", [0x22ED, 0x0000]),
    ("nu;", [0x03BD, 0x0000]),
    ("num;", [0x0023, 0x0000]),
    ("numero;", [0x2116, 0x0000]),
    ("numsp;", [0x2007, 0x0000]),
    ("nvDash;", [0x22AD, 0x0000]),
    ("nvHarr;", [0x2904, 0x0000]),
    ("nvap;", [0x224D, 0x20D2]),
    ("nvdash;", [0x22AC, 0x0000]),
    ("nvge;", [0x2265, 0x20D2]),
    ("nvgt;", [0x003E, 0x20D2]),
    ("nvinfin;", [0x29DE, 0x0000]),
    ("nvlArr;", [0x2902, 0x0000]),
    ("nvle;", [0x2264, 0x20D2]),
    ("nvlt;", [0x003C, 0x20D2]),
    ("nvltrie;", [0x22B4, 0x20D2]),
    ("nvrArr;", [0x2903, 0x0000]),
    ("nvrtrie;", [0x22B5, 0x20D2]),
    ("nvsim;", [0x223C, 0x20D2]),
    ("nwArr;", [0x21D6, 0x0000]),
    ("nwarhk;", [0x2923, 0x0000]),
    ("nwarr;", [0x2196, 0x0000]),
    ("nwarrow;", [0x2196, 0x0000]),
    ("nwnear;", [0x2927, 0x0000]),
    ("oS;", [0x24C8, 0x0000]),
    ("oacute", [0x00F3, 0x0000]),
    ("oacute;", [0x00F3, 0x0000]),
    ("oast;", [0x229B, 0x0000]),
    ("ocir;", [0x229A, 0x0000]),
    ("ocirc", [0x00F4, 0x0000]),
    ("ocirc;", [0x00F4, 0x0000]),
    ("ocy;", [0x043E, 0x0000]),
    ("odash;", [0x229D, 0x0000]),
    ("odblac;", [0x0151, 0x0000]),
    ("odiv;", [0x2A38, 0x0000]),
    ("odot;", [0x2299, 0x0000]),
    ("odsold;", [0x29BC, 0x0000]),
    ("oelig;", [0x0153, 0x0000]),
    ("ofcir;", [0x29BF, 0x0000]),
    ("ofr;", [0x1D52C, 0x0000]),
    ("ogon;", [0x02DB, 0x0000]),
    ("ograve", [0x00F2, 0x0000]),
    ("ograve;", [0x00F2, 0x0000]),
    ("ogt;", [0x29C1, 0x0000]),
    ("ohbar;", [0x29B5, 0x0000]),
    ("ohm;", [0x03A9, 0x0000]),
    ("oint;", [0x222E, 0x0000]),
    ("olarr;", [0x21BA, 0x0000]),
    ("olcir;", [0x29BE, 0x0000]),
    ("olcross;", [0x29BB, 0x0000]),
    ("oline;", [0x203E, 0x0000]),
    ("olt;", [0x29C0, 0x0000]),
    ("omacr;", [0x014D, 0x0000]),
    ("omega;", [0x03C9, 0x0000]),
    ("omicron;", [0x03BF, 0x0000]),
    ("omid;", [0x29B6, 0x0000]),
    ("ominus;", [0x2296, 0x0000]),
    ("oopf;", [0x1D560, 0x0000]),
    ("opar;", [0x29B7, 0x0000]),
    ("operp;", [0x29B9, 0x0000]),
    ("oplus;", [0x2295, 0x0000]),
    ("or;", [0x2228, 0x0000]),
    ("orarr;", [0x21BB, 0x0000]),
    ("ord;", [0x2A5D, 0x0000]),
    ("order;", [0x2134, 0x0000]),
    ("orderof;", [0x2134, 0x0000]),
    ("ordf", [0x00AA, 0x0000]),
    ("ordf;", [0x00AA, 0x0000]),
    ("ordm", [0x00BA, 0x0000]),
    ("ordm;", [0x00BA, 0x0000]),
    ("origof;", [0x22B6, 0x0000]),
    ("oror;", [0x2A56, 0x0000]),
    ("orslope;", [0x2A57, 0x0000]),
    ("orv;", [0x2A5B, 0x0000]),
    ("oscr;", [0x2134, 0x0000]),
    ("oslash", [0x00F8, 0x0000]),
    ("oslash;", [0x00F8, 0x0000]),
    ("osol;", [0x2298, 0x0000]),
    ("otilde", [0x00F5, 0x0000]),
    ("otilde;", [0x00F5, 0x0000]),
    ("otimes;", [0x2297, 0x0000]),
    ("otimesas;", [0x2A36, 0x0000]),
    ("ouml", [0x00F6, 0x0000]),
    ("ouml;", [0x00F6, 0x0000]),
    ("ovbar;", [0x233D, 0x0000]),
    ("par;", [0x2225, 0x0000]),
    ("para", [0x00B6, 0x0000]),
    ("para;", [0x00B6, 0x0000]),
    ("parallel;", [0x2225, 0x0000]),
    ("parsim;", [0x2AF3, 0x0000]),
    ("parsl;", [0x2AFD, 0x0000]),
    ("part;", [0x2202, 0x0000]),
    ("pcy;", [0x043F, 0x0000]),
    ("percnt;", [0x0025, 0x0000]),
    ("period;", [0x002E, 0x0000]),
    ("permil;", [0x2030, 0x0000]),
    ("perp;", [0x22A5, 0x0000]),
    ("pertenk;", [0x2031, 0x0000]),
    ("pfr;", [0x1D52D, 0x0000]),
    ("phi;", [0x03C6, 0x0000]),
    ("phiv;", [0x03D5, 0x0000]),
    ("phmmat;", [0x2133, 0x0000]),
    ("phone;", [0x260E, 0x0000]),
    ("pi;", [0x03C0, 0x0000]),
    ("pitchfork;", [0x22D4, 0x0000]),
    ("piv;", [0x03D6, 0x0000]),
    ("planck;", [0x210F, 0x0000]),
    ("planckh;", [0x210E, 0x0000]),
    ("plankv;", [0x210F, 0x0000]),
    ("plus;", [0x002B, 0x0000]),
    ("plusacir;", [0x2A23, 0x0000]),
    ("plusb;", [0x229E, 0x0000]),
    ("pluscir;", [0x2A22, 0x0000]),
    ("plusdo;", [0x2214, 0x0000]),
    ("plusdu;", [0x2A25, 0x0000]),
    ("pluse;", [0x2A72, 0x0000]),
    ("plusmn", [0x00B1, 0x0000]),
    ("plusmn;", [0x00B1, 0x0000]),
    ("plussim;", [0x2A26, 0x0000]),
    ("plustwo;", [0x2A27, 0x0000]),
    ("pm;", [0x00B1, 0x0000]),
    ("pointint;", [0x2A15, 0x0000]),
    ("popf;", [0x1D561, 0x0000]),
    ("pound", [0x00A3, 0x0000]),
    ("pound;", [0x00A3, 0x0000]),
    ("pr;", [0x227A, 0x0000]),
    ("prE;", [0x2AB3, 0x0000]),
    ("prap;", [0x2AB7, 0x0000]),
    ("prcue;", [0x227C, 0x0000]),
    ("pre;", [0x2AAF, 0x0000]),
    ("prec;", [0x227A, 0x0000]),
    ("precapprox;", [0x2AB7, 0x0000]),
    ("preccurlyeq;", [0x227C, 0x0000]),
    ("preceq;", [0x2AAF, 0x0000]),
    ("precnapprox;", [0x2AB9, 0x0000]),
    ("precneqq;", [0x2AB5, 0x0000]),
    ("precnsim;", [0x22E8, 0x0000]),
    ("precsim;", [0x227E, 0x0000]),
    ("prime;", [0x2032, 0x0000]),
    ("primes;", [0x2119, 0x0000]),
    ("prnE;", [0x2AB5, 0x0000]),
    ("prnap;", [0x2AB9, 0x0000]),
    ("prnsim;", [0x22E8, 0x0000]),
    ("prod;", [0x220F, 0x0000]),
    ("profalar;", [0x232E, 0x0000]),
    ("profline;", [0x2312, 0x0000]),
    ("profsurf;", [0x2313, 0x0000]),
    ("prop;", [0x221D, 0x0000]),
    ("propto;", [0x221D, 0x0000]),
    ("prsim;", [0x227E, 0x0000]),
    ("prurel;", [0x22B0, 0x0000]),
    ("pscr;", [0x1D4C5, 0x0000]),
    ("psi;", [0x03C8, 0x0000]),
    ("puncsp;", [0x2008, 0x0000]),
    ("qfr;", [0x1D52E, 0x0000]),
    ("qint;", [0x2A0C, 0x0000]),
    ("qopf;", [0x1D562, 0x0000]),
    ("qprime;", [0x2057, 0x0000]),
    ("qscr;", [0x1D4C6, 0x0000]),
    ("quaternions;", [0x210D, 0x0000]),
    ("quatint;", [0x2A16, 0x0000]),
    ("quest;", [0x003F, 0x0000]),
    ("questeq;", [0x225F, 0x0000]),
    ("quot", [0x0022, 0x0000]),
    ("quot;", [0x0022, 0x0000]),
    ("rAarr;", [0x21DB, 0x0000]),
    ("rArr;", [0x21D2, 0x0000]),
    ("rAtail;", [0x291C, 0x0000]),
    ("rBarr;", [0x290F, 0x0000]),
    ("rHar;", [0x2964, 0x0000]),
    ("race;", [0x223D, 0x0331]),
    ("racute;", [0x0155, 0x0000]),
    ("radic;", [0x221A, 0x0000]),
    ("raemptyv;", [0x29B3, 0x0000]),
    ("rang;", [0x27E9, 0x0000]),
    ("rangd;", [0x2992, 0x0000]),
    ("range;", [0x29A5, 0x0000]),
    ("rangle;", [0x27E9, 0x0000]),
    ("raquo", [0x00BB, 0x0000]),
    ("raquo;", [0x00BB, 0x0000]),
    ("rarr;", [0x2192, 0x0000]),
    ("rarrap;", [0x2975, 0x0000]),
    ("rarrb;", [0x21E5, 0x0000]),
    ("rarrbfs;", [0x2920, 0x0000]),
    ("rarrc;", [0x2933, 0x0000]),
    ("rarrfs;", [0x291E, 0x0000]),
    ("rarrhk;", [0x21AA, 0x0000]),
    ("rarrlp;", [0x21AC, 0x0000]),
    ("rarrpl;", [0x2945, 0x0000]),
    ("rarrsim;", [0x2974, 0x0000]),
    ("rarrtl;", [0x21A3, 0x0000]),
    ("rarrw;", [0x219D, 0x0000]),
    ("ratail;", [0x291A, 0x0000]),
    ("ratio;", [0x2236, 0x0000]),
    ("rationals;", [0x211A, 0x0000]),
    ("rbarr;", [0x290D, 0x0000]),
    ("rbbrk;", [0x2773, 0x0000]),
    ("rbrace;", [0x007D, 0x0000]),
    ("rbrack;", [0x005D, 0x0000]),
    ("rbrke;", [0x298C, 0x0000]),
    ("rbrksld;", [0x298E, 0x0000]),
    ("rbrkslu;", [0x2990, 0x0000]),
    ("rcaron;", [0x0159, 0x0000]),
    ("rcedil;", [0x0157, 0x0000]),
    ("rceil;", [0x2309, 0x0000]),
    ("rcub;", [0x007D, 0x0000]),
    ("rcy;", [0x0440, 0x0000]),
    ("rdca;", [0x2937, 0x0000]),
    ("rdldhar;", [0x2969, 0x0000]),
    ("rdquo;", [0x201D, 0x0000]),
    ("rdquor;", [0x201D, 0x0000]),
    ("rdsh;", [0x21B3, 0x0000]),
    ("real;", [0x211C, 0x0000]),
    ("realine;", [0x211B, 0x0000]),
    ("realpart;", [0x211C, 0x0000]),
    ("reals;", [0x211D, 0x0000]),
    ("rect;", [0x25AD, 0x0000]),
    ("reg", [0x00AE, 0x0000]),
    ("reg;", [0x00AE, 0x0000]),
    ("rfisht;", [0x297D, 0x0000]),
    ("rfloor;", [0x230B, 0x0000]),
    ("rfr;", [0x1D52F, 0x0000]),
    ("rhard;", [0x21C1, 0x0000]),
    ("rharu;", [0x21C0, 0x0000]),
    ("rharul;", [0x296C, 0x0000]),
    ("rho;", [0x03C1, 0x0000]),
    ("rhov;", [0x03F1, 0x0000]),
    ("rightarrow;", [0x2192, 0x0000]),
    ("rightarrowtail;", [0x21A3, 0x0000]),
    ("rightharpoondown;", [0x21C1, 0x0000]),
    ("rightharpoonup;", [0x21C0, 0x0000]),
    ("rightleftarrows;", [0x21C4, 0x0000]),
    ("rightleftharpoons;", [0x21CC, 0x0000]),
    ("rightrightarrows;", [0x21C9, 0x0000]),
    ("rightsquigarrow;", [0x219D, 0x0000]),
    ("rightthreetimes;", [0x22CC, 0x0000]),
    ("ring;", [0x02DA, 0x0000]),
    ("risingdotseq;", [0x2253, 0x0000]),
    ("rlarr;", [0x21C4, 0x0000]),
    ("rlhar;", [0x21CC, 0x0000]),
    ("rlm;", [0x200F, 0x0000]),
    ("rmoust;", [0x23B1, 0x0000]),
    ("rmoustache;", [0x23B1, 0x0000]),
    ("rnmid;", [0x2AEE, 0x0000]),
    ("roang;", [0x27ED, 0x0000]),
    ("roarr;", [0x21FE, 0x0000]),
    ("robrk;", [0x27E7, 0x0000]),
    ("ropar;", [0x2986, 0x0000]),
    ("ropf;", [0x1D563, 0x0000]),
    ("roplus;", [0x2A2E, 0x0000]),
    ("rotimes;", [0x2A35, 0x0000]),
    ("rpar;", [0x0029, 0x0000]),
    ("rpargt;", [0x2994, 0x0000]),
    ("rppolint;", [0x2A12, 0x0000]),
    ("rrarr;", [0x21C9, 0x0000]),
    ("rsaquo;", [0x203A, 0x0000]),
    ("rscr;", [0x1D4C7, 0x0000]),
    ("rsh;", [0x21B1, 0x0000]),
    ("rsqb;", [0x005D, 0x0000]),
    ("rsquo;", [0x2019, 0x0000]),
    ("rsquor;", [0x2019, 0x0000]),
    ("rthree;", [0x22CC, 0x0000]),
    ("rtimes;", [0x22CA, 0x0000]),
    ("rtri;", [0x25B9, 0x0000]),
    ("rtrie;", [0x22B5, 0x0000]),
    ("rtrif;", [0x25B8, 0x0000]),
    ("rtriltri;", [0x29CE, 0x0000]),
    ("ruluhar;", [0x2968, 0x0000]),
    ("rx;", [0x211E, 0x0000]),
    ("sacute;", [0x015B, 0x0000]),
    ("sbquo;", [0x201A, 0x0000]),
    ("sc;", [0x227B, 0x0000]),
    ("scE;", [0x2AB4, 0x0000]),
    ("scap;", [0x2AB8, 0x0000]),
    ("scaron;", [0x0161, 0x0000]),
    ("sccue;", [0x227D, 0x0000]),
    ("sce;", [0x2AB0, 0x0000]),
    ("scedil;", [0x015F, 0x0000]),
    ("scirc;", [0x015D, 0x0000]),
    ("scnE;", [0x2AB6, 0x0000]),
    ("scnap;", [0x2ABA, 0x0000]),
    ("scnsim;", [0x22E9, 0x0000]),
    ("scpolint;", [0x2A13, 0x0000]),
    ("scsim;", [0x227F, 0x0000]),
    ("scy;", [0x0441, 0x0000]),
    ("sdot;", [0x22C5, 0x0000]),
    ("sdotb;", [0x22A1, 0x0000]),
    ("sdote;", [0x2A66, 0x0000]),
    ("seArr;", [0x21D8, 0x0000]),
    ("searhk;", [0x2925, 0x0000]),
    ("searr;", [0x2198, 0x0000]),
    ("searrow;", [0x2198, 0x0000]),
    ("sect", [0x00A7, 0x0000]),
    ("sect;", [0x00A7, 0x0000]),
    ("semi;", [0x003B, 0x0000]),
    ("seswar;", [0x2929, 0x0000]),
    ("setminus;", [0x2216, 0x0000]),
    ("setmn;", [0x2216, 0x0000]),
    ("sext;", [0x2736, 0x0000]),
    ("sfr;", [0x1D530, 0x0000]),
    ("sfrown;", [0x2322, 0x0000]),
    ("sharp;", [0x266F, 0x0000]),
    ("shchcy;", [0x0449, 0x0000]),
    ("shcy;", [0x0448, 0x0000]),
    ("shortmid;", [0x2223, 0x0000]),
    ("shortparallel;", [0x2225, 0x0000]),
    ("shy", [0x00AD, 0x0000]),
    ("shy;", [0x00AD, 0x0000]),
    ("sigma;", [0x03C3, 0x0000]),
    ("sigmaf;", [0x03C2, 0x0000]),
    ("sigmav;", [0x03C2, 0x0000]),
    ("sim;", [0x223C, 0x0000]),
    ("simdot;", [0x2A6A, 0x0000]),
    ("sime;", [0x2243, 0x0000]),
    ("simeq;", [0x2243, 0x0000]),
    ("simg;", [0x2A9E, 0x0000]),
    ("simgE;", [0x2AA0, 0x0000]),
    ("siml;", [0x2A9D, 0x0000]),
    ("simlE;", [0x2A9F, 0x0000]),
    ("simne;", [0x2246, 0x0000]),
    ("simplus;", [0x2A24, 0x0000]),
    ("simrarr;", [0x2972, 0x0000]),
    ("slarr;", [0x2190, 0x0000]),
    ("smallsetminus;", [0x2216, 0x0000]),
    ("smashp;", [0x2A33, 0x0000]),
    ("smeparsl;", [0x29E4, 0x0000]),
    ("smid;", [0x2223, 0x0000]),
    ("smile;", [0x2323, 0x0000]),
    ("smt;", [0x2AAA, 0x0000]),
    ("smte;", [0x2AAC, 0x0000]),
    ("smtes;", [0x2AAC, 0xFE00]),
    ("softcy;", [0x044C, 0x0000]),
    ("sol;", [0x002F, 0x0000]),
    ("solb;", [0x29C4, 0x0000]),
    ("solbar;", [0x233F, 0x0000]),
    ("sopf;", [0x1D564, 0x0000]),
    ("spades;", [0x2660, 0x0000]),
    ("spadesuit;", [0x2660, 0x0000]),
    ("spar;", [0x2225, 0x0000]),
    ("sqcap;", [0x2293, 0x0000]),
    ("sqcaps;", [0x2293, 0xFE00]),
    ("sqcup;", [0x2294, 0x0000]),
    ("sqcups;", [0x2294, 0xFE00]),
    ("sqsub;", [0x228F, 0x0000]),
    ("sqsube;", [0x2291, 0x0000]),
    ("sqsubset;", [0x228F, 0x0000]),
    ("sqsubseteq;", [0x2291, 0x0000]),
    ("sqsup;", [0x2290, 0x0000]),
    ("sqsupe;", [0x2292, 0x0000]),
    ("sqsupset;", [0x2290, 0x0000]),
    ("sqsupseteq;", [0x2292, 0x0000]),
    ("squ;", [0x25A1, 0x0000]),
    ("square;", [0x25A1, 0x0000]),
    ("squarf;", [0x25AA, 0x0000]),
    ("squf;", [0x25AA, 0x0000]),
    ("srarr;", [0x2192, 0x0000]),
    ("sscr;", [0x1D4C8, 0x0000]),
    ("ssetmn;", [0x2216, 0x0000]),
    ("ssmile;", [0x2323, 0x0000]),
    ("sstarf;", [0x22C6, 0x0000]),
    ("star;", [0x2606, 0x0000]),
    ("starf;", [0x2605, 0x0000]),
    ("straightepsilon;", [0x03F5, 0x0000]),
    ("straightphi;", [0x03D5, 0x0000]),
    ("strns;", [0x00AF, 0x0000]),
    ("sub;", [0x2282, 0x0000]),
    ("subE;", [0x2AC5, 0x0000]),
    ("subdot;", [0x2ABD, 0x0000]),
    ("sube;", [0x2286, 0x0000]),
    ("subedot;", [0x2AC3, 0x0000]),
    ("submult;", [0x2AC1, 0x0000]),
    ("subnE;", [0x2ACB, 0x0000]),
    ("subne;", [0x228A, 0x0000]),
    ("subplus;", [0x2ABF, 0x0000]),
    ("subrarr;", [0x2979, 0x0000]),
    ("subset;", [0x2282, 0x0000]),
    ("subseteq;", [0x2286, 0x0000]),
    ("subseteqq;", [0x2AC5, 0x0000]),
    ("subsetneq;", [0x228A, 0x0000]),
    ("subsetneqq;", [0x2ACB, 0x0000]),
    ("subsim;", [0x2AC7, 0x0000]),
    ("subsub;", [0x2AD5, 0x0000]),
    ("subsup;", [0x2AD3, 0x0000]),
    ("succ;", [0x227B, 0x0000]),
    ("succapprox;", [0x2AB8, 0x0000]),
    ("succcurlyeq;", [0x227D, 0x0000]),
    ("succeq;", [0x2AB0, 0x0000]),
    ("succnapprox;", [0x2ABA, 0x0000]),
    ("succneqq;", [0x2AB6, 0x0000]),
    ("succnsim;", [0x22E9, 0x0000]),
    ("succsim;", [0x227F, 0x0000]),
    ("sum;", [0x2211, 0x0000]),
    ("sung;", [0x266A, 0x0000]),
    ("sup1", [0x00B9, 0x0000]),
    ("sup1;", [0x00B9, 0x0000]),
    ("sup2", [0x00B2, 0x0000]),
    ("sup2;", [0x00B2, 0x0000]),
    ("sup3", [0x00B3, 0x0000]),
    ("sup3;", [0x00B3, 0x0000]),
    ("sup;", [0x2283, 0x0000]),
    ("supE;", [0x2AC6, 0x0000]),
    ("supdot;", [0x2ABE, 0x0000]),
    ("supdsub;", [0x2AD8, 0x0000]),
    ("supe;", [0x2287, 0x0000]),
    ("supedot;", [0x2AC4, 0x0000]),
    ("suphsol;", [0x27C9, 0x0000]),
    ("suphsub;", [0x2AD7, 0x0000]),
    ("suplarr;", [0x297B, 0x0000]),
    ("supmult;", [0x2AC2, 0x0000]),
    ("supnE;", [0x2ACC, 0x0000]),
    ("supne;", [0x228B, 0x0000]),
    ("supplus;", [0x2AC0, 0x0000]),
    ("supset;", [0x2283, 0x0000]),
    ("supseteq;", [0x2287, 0x0000]),
    ("supseteqq;", [0x2AC6, 0x0000]),
    ("supsetneq;", [0x228B, 0x0000]),
    ("supsetneqq;", [0x2ACC, 0x0000]),
    ("supsim;", [0x2AC8, 0x0000]),
    ("supsub;", [0x2AD4, 0x0000]),
    ("supsup;", [0x2AD6, 0x0000]),
    ("swArr;", [0x21D9, 0x0000]),
    ("swarhk;", [0x2926, 0x0000]),
    ("swarr;", [0x2199, 0x0000]),
    ("swarrow;", [0x2199, 0x0000]),
    ("swnwar;", [0x292A, 0x0000]),
    ("szlig", [0x00DF, 0x0000]),
    ("szlig;", [0x00DF, 0x0000]),
    ("target;", [0x2316, 0x0000]),
    ("tau;", [0x03C4, 0x0000]),
    ("tbrk;", [0x23B4, 0x0000]),
    ("tcaron;", [0x0165, 0x0000]),
    ("tcedil;", [0x0163, 0x0000]),
    ("tcy;", [0x0442, 0x0000]),
    ("tdot;", [0x20DB, 0x0000]),
    ("telrec;", [0x2315, 0x0000]),
    ("tfr;", [0x1D531, 0x0000]),
    ("there4;", [0x2234, 0x0000]),
    ("therefore;", [0x2234, 0x0000]),
    ("theta;", [0x03B8, 0x0000]),
    ("thetasym;", [0x03D1, 0x0000]),
    ("thetav;", [0x03D1, 0x0000]),
    ("thickapprox;", [0x2248, 0x0000]),
    ("thicksim;", [0x223C, 0x0000]),
    ("thinsp;", [0x2009, 0x0000]),
    ("thkap;", [0x2248, 0x0000]),
    ("thksim;", [0x223C, 0x0000]),
    ("thorn", [0x00FE, 0x0000]),
    ("thorn;", [0x00FE, 0x0000]),
    ("tilde;", [0x02DC, 0x0000]),
    ("times", [0x00D7, 0x0000]),
    ("times;", [0x00D7, 0x0000]),
    ("timesb;", [0x22A0, 0x0000]),
    ("timesbar;", [0x2A31, 0x0000]),
    ("timesd;", [0x2A30, 0x0000]),
    ("tint;", [0x222D, 0x0000]),
    ("toea;", [0x2928, 0x0000]),
    ("top;", [0x22A4, 0x0000]),
    ("topbot;", [0x2336, 0x0000]),
    ("topcir;", [0x2AF1, 0x0000]),
    ("topf;", [0x1D565, 0x0000]),
    ("topfork;", [0x2ADA, 0x0000]),
    ("tosa;", [0x2929, 0x0000]),
    ("tprime;", [0x2034, 0x0000]),
    ("trade;", [0x2122, 0x0000]),
    ("triangle;", [0x25B5, 0x0000]),
    ("triangledown;", [0x25BF, 0x0000]),
    ("triangleleft;", [0x25C3, 0x0000]),
    ("trianglelefteq;", [0x22B4, 0x0000]),
    ("triangleq;", [0x225C, 0x0000]),
    ("triangleright;", [0x25B9, 0x0000]),
    ("trianglerighteq;", [0x22B5, 0x0000]),
    ("tridot;", [0x25EC, 0x0000]),
    ("trie;", [0x225C, 0x0000]),
    ("triminus;", [0x2A3A, 0x0000]),
    ("triplus;", [0x2A39, 0x0000]),
    ("trisb;", [0x29CD, 0x0000]),
    ("tritime;", [0x2A3B, 0x0000]),
    ("trpezium;", [0x23E2, 0x0000]),
    ("tscr;", [0x1D4C9, 0x0000]),
    ("tscy;", [0x0446, 0x0000]),
    ("tshcy;", [0x045B, 0x0000]),
    ("tstrok;", [0x0167, 0x0000]),
    ("twixt;", [0x226C, 0x0000]),
    ("twoheadleftarrow;", [0x219E, 0x0000]),
    ("twoheadrightarrow;", [0x21A0, 0x0000]),
    ("uArr;", [0x21D1, 0x0000]),
    ("uHar;", [0x2963, 0x0000]),
    ("uacute", [0x00FA, 0x0000]),
    ("uacute;", [0x00FA, 0x0000]),
    ("uarr;", [0x2191, 0x0000]),
    ("ubrcy;", [0x045E, 0x0000]),
    ("ubreve;", [0x016D, 0x0000]),
    ("ucirc", [0x00FB, 0x0000]),
    ("ucirc;", [0x00FB, 0x0000]),
    ("ucy;", [0x0443, 0x0000]),
    ("udarr;", [0x21C5, 0x0000]),
    ("udblac;", [0x0171, 0x0000]),
    ("udhar;", [0x296E, 0x0000]),
    ("ufisht;", [0x297E, 0x0000]),
    ("ufr;", [0x1D532, 0x0000]),
    ("ugrave", [0x00F9, 0x0000]),
    ("ugrave;", [0x00F9, 0x0000]),
    ("uharl;", [0x21BF, 0x0000]),
    ("uharr;", [0x21BE, 0x0000]),
    ("uhblk;", [0x2580, 0x0000]),
    ("ulcorn;", [0x231C, 0x0000]),
    ("ulcorner;", [0x231C, 0x0000]),
    ("ulcrop;", [0x230F, 0x0000]),
    ("ultri;", [0x25F8, 0x0000]),
    ("umacr;", [0x016B, 0x0000]),
    ("uml", [0x00A8, 0x0000]),
    ("uml;", [0x00A8, 0x0000]),
    ("uogon;", [0x0173, 0x0000]),
    ("uopf;", [0x1D566, 0x0000]),
    ("uparrow;", [0x2191, 0x0000]),
    ("updownarrow;", [0x2195, 0x0000]),
    ("upharpoonleft;", [0x21BF, 0x0000]),
    ("upharpoonright;", [0x21BE, 0x0000]),
    ("uplus;", [0x228E, 0x0000]),
    ("upsi;", [0x03C5, 0x0000]),
    ("upsih;", [0x03D2, 0x0000]),
    ("upsilon;", [0x03C5, 0x0000]),
    ("upuparrows;", [0x21C8, 0x0000]),
    ("urcorn;", [0x231D, 0x0000]),
    ("urcorner;", [0x231D, 0x0000]),
    ("urcrop;", [0x230E, 0x0000]),
    ("uring;", [0x016F, 0x0000]),
    ("urtri;", [0x25F9, 0x0000]),
    ("uscr;", [0x1D4CA, 0x0000]),
    ("utdot;", [0x22F0, 0x0000]),
    ("utilde;", [0x0169, 0x0000]),
    ("utri;", [0x25B5, 0x0000]),
    ("utrif;", [0x25B4, 0x0000]),
    ("uuarr;", [0x21C8, 0x0000]),
    ("uuml", [0x00FC, 0x0000]),
    ("uuml;", [0x00FC, 0x0000]),
    ("uwangle;", [0x29A7, 0x0000]),
    ("vArr;", [0x21D5, 0x0000]),
    ("vBar;", [0x2AE8, 0x0000]),
    ("vBarv;", [0x2AE9, 0x0000]),
    ("vDash;", [0x22A8, 0x0000]),
    ("vangrt;", [0x299C, 0x0000]),
    ("varepsilon;", [0x03F5, 0x0000]),
    ("varkappa;", [0x03F0, 0x0000]),
    ("varnothing;", [0x2205, 0x0000]),
    ("varphi;", [0x03D5, 0x0000]),
    ("varpi;", [0x03D6, 0x0000]),
    ("varpropto;", [0x221D, 0x0000]),
    ("varr;", [0x2195, 0x0000]),
    ("varrho;", [0x03F1, 0x0000]),
    ("varsigma;", [0x03C2, 0x0000]),
    ("varsubsetneq;", [0x228A, 0xFE00]),
    ("varsubsetneqq;", [0x2ACB, 0xFE00]),
    ("varsupsetneq;", [0x228B, 0xFE00]),
    ("varsupsetneqq;", [0x2ACC, 0xFE00]),
    ("vartheta;", [0x03D1, 0x0000]),
    ("vartriangleleft;", [0x22B2, 0x0000]),
    ("vartriangleright;", [0x22B3, 0x0000]),
    ("vcy;", [0x0432, 0x0000]),
    ("vdash;", [0x22A2, 0x0000]),
    ("vee;", [0x2228, 0x0000]),
    ("veebar;", [0x22BB, 0x0000]),
    ("veeeq;", [0x225A, 0x0000]),
    ("vellip;", [0x22EE, 0x0000]),
    ("verbar;", [0x007C, 0x0000]),
    ("vert;", [0x007C, 0x0000]),
    ("vfr;", [0x1D533, 0x0000]),
    ("vltri;", [0x22B2, 0x0000]),
    ("vnsub;", [0x2282, 0x20D2]),
    ("vnsup;", [0x2283, 0x20D2]),
    ("vopf;", [0x1D567, 0x0000]),
    ("vprop;", [0x221D, 0x0000]),
    ("vrtri;", [0x22B3, 0x0000]),
    ("vscr;", [0x1D4CB, 0x0000]),
    ("vsubnE;", [0x2ACB, 0xFE00]),
    ("vsubne;", [0x228A, 0xFE00]),
    ("vsupnE;", [0x2ACC, 0xFE00]),
    ("vsupne;", [0x228B, 0xFE00]),
    ("vzigzag;", [0x299A, 0x0000]),
    ("wcirc;", [0x0175, 0x0000]),
    ("wedbar;", [0x2A5F, 0x0000]),
    ("wedge;", [0x2227, 0x0000]),
    ("wedgeq;", [0x2259, 0x0000]),
    ("weierp;", [0x2118, 0x0000]),
    ("wfr;", [0x1D534, 0x0000]),
    ("wopf;", [0x1D568, 0x0000]),
    ("wp;", [0x2118, 0x0000]),
    ("wr;", [0x2240, 0x0000]),
    ("wreath;", [0x2240, 0x0000]),
    ("wscr;", [0x1D4CC, 0x0000]),
    ("xcap;", [0x22C2, 0x0000]),
    ("xcirc;", [0x25EF, 0x0000]),
    ("xcup;", [0x22C3, 0x0000]),
    ("xdtri;", [0x25BD, 0x0000]),
    ("xfr;", [0x1D535, 0x0000]),
    ("xhArr;", [0x27FA, 0x0000]),
    ("xharr;", [0x27F7, 0x0000]),
    ("xi;", [0x03BE, 0x0000]),
    ("xlArr;", [0x27F8, 0x0000]),
    ("xlarr;", [0x27F5, 0x0000]),
    ("xmap;", [0x27FC, 0x0000]),
    ("xnis;", [0x22FB, 0x0000]),
    ("xodot;", [0x2A00, 0x0000]),
    ("xopf;", [0x1D569, 0x0000]),
    ("xoplus;", [0x2A01, 0x0000]),
    ("xotime;", [0x2A02, 0x0000]),
    ("xrArr;", [0x27F9, 0x0000]),
    ("xrarr;", [0x27F6, 0x0000]),
    ("xscr;", [0x1D4CD, 0x0000]),
    ("xsqcup;", [0x2A06, 0x0000]),
    ("xuplus;", [0x2A04, 0x0000]),
    ("xutri;", [0x25B3, 0x0000]),
    ("xvee;", [0x22C1, 0x0000]),
    ("xwedge;", [0x22C0, 0x0000]),
    ("yacute", [0x00FD, 0x0000]),
    ("yacute;", [0x00FD, 0x0000]),
    ("yacy;", [0x044F, 0x0000]),
    ("ycirc;", [0x0177, 0x0000]),
    ("ycy;", [0x044B, 0x0000]),
    ("yen", [0x00A5, 0x0000]),
    ("yen;", [0x00A5, 0x0000]),
    ("yfr;", [0x1D536, 0x0000]),
    ("yicy;", [0x0457, 0x0000]),
    ("yopf;", [0x1D56A, 0x0000]),
    ("yscr;", [0x1D4CE, 0x0000]),
    ("yucy;", [0x044E, 0x0000]),
    ("yuml", [0x00FF, 0x0000]),
    ("yuml;", [0x00FF, 0x0000]),
    ("zacute;", [0x017A, 0x0000]),
    ("zcaron;", [0x017E, 0x0000]),
    ("zcy;", [0x0437, 0x0000]),
    ("zdot;", [0x017C, 0x0000]),
    ("zeetrf;", [0x2128, 0x0000]),
    ("zeta;", [0x03B6, 0x0000]),
    ("zfr;", [0x1D537, 0x0000]),
    ("zhcy;", [0x0436, 0x0000]),
    ("zigrarr;", [0x21DD, 0x0000]),
    ("zopf;", [0x1D56B, 0x0000]),
    ("zscr;", [0x1D4CF, 0x0000]),
    ("zwj;", [0x200D, 0x0000]),
    ("zwnj;", [0x200C, 0x0000]),
];
